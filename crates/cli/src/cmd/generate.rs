//! Implementation of the `sb gen` command.
//!
//! Resolves the dependency closure of one target, plans every module with the
//! `swiftc` planner and writes `build.ninja` into the output directory.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use antimony_lib::toolchain::SwiftcPlanner;
use antimony_lib::{GenerateOptions, Resolver, ResolverConfig, generate};

use crate::output::{format_duration, print_stat, print_success};
use crate::workspace::{absolute, resolve_root};

pub fn cmd_gen(
  out_dir: &Path,
  root: Option<PathBuf>,
  target: &str,
  link_flags: Vec<String>,
) -> Result<()> {
  let root = resolve_root(root)?;
  let resolver = Resolver::new(ResolverConfig::new(&root));
  let label = resolver
    .label(target)
    .with_context(|| format!("Invalid target label: {}", target))?;

  let options = GenerateOptions {
    link_flags,
    ..GenerateOptions::new(absolute(out_dir)?)
  };

  let start = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let summary = rt
    .block_on(generate(&resolver, &label, &options, &SwiftcPlanner))
    .with_context(|| format!("Failed to generate build file for {}", target))?;

  print_success(&format!("Generated {}", summary.path.display()));
  print_stat("Targets", &summary.targets.to_string());
  print_stat("Actions", &summary.actions.to_string());
  print_stat("Files evaluated", &resolver.load_count().to_string());
  print_stat("Time", &format_duration(start.elapsed()));

  Ok(())
}
