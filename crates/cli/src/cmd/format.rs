//! Implementation of the `sb format` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use antimony_lib::{Resolver, ResolverConfig, Target};

use crate::output::{OutputFormat, print_json, symbols};
use crate::workspace::resolve_root;

#[derive(Serialize)]
struct FormatOutput<'a> {
  root: String,
  targets: Vec<&'a Target>,
}

pub fn cmd_format(root: Option<PathBuf>, target: &str, output: OutputFormat) -> Result<()> {
  let root = resolve_root(root)?;
  let resolver = Resolver::new(ResolverConfig::new(&root));
  let label = resolver
    .label(target)
    .with_context(|| format!("Invalid target label: {}", target))?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let graph = rt
    .block_on(resolver.closure(&label))
    .with_context(|| format!("Failed to resolve {}", target))?;

  let ordered = graph.ordered();
  if output.is_json() {
    return print_json(&FormatOutput {
      root: label.display_relative(&root),
      targets: ordered.iter().map(|&target| target.as_ref()).collect(),
    });
  }

  for target in ordered {
    println!(
      "{} {}",
      target
        .label
        .display_relative(&root)
        .if_supports_color(Stream::Stdout, |s| s.bold()),
      format!("({})", target.kind.builtin()).if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
    if let Some(module) = &target.module {
      println!("  module: {}", module.module_name);
      println!("  output: {}", module.output_file_name());
      for source in &module.sources {
        let shown = source.strip_prefix(&root).unwrap_or(source);
        println!("  source: {}", shown.display());
      }
    }
    for dependency in target.dependency_labels() {
      println!("  {} {}", symbols::ARROW, dependency.display_relative(&root));
    }
  }

  Ok(())
}
