//! The generation pipeline: resolve a root target's closure, plan every
//! module through a [`ToolchainPlanner`], and write `build.ninja`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::label::Label;
use crate::ninja::{Build, NinjaError, NinjaWriter, Rule, escape_value};
use crate::resolver::{BuildGraph, ResolveError, Resolver};
use crate::target::{Target, TargetKind};
use crate::toolchain::{
  ActionKind, BuildAction, DEFAULT_TOOL, Invocation, PlanError, SwiftcPlanner, ToolchainPlanner,
  module_dependencies, shell_join,
};

/// Name of the generated file inside the output directory.
pub const BUILD_NINJA: &str = "build.ninja";

#[derive(Debug, Error)]
pub enum GenerateError {
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error("failed to plan {label}: {source}")]
  Plan {
    label: Label,
    #[source]
    source: PlanError,
  },

  #[error("{0} is a config and has nothing to build")]
  ConfigRoot(Label),

  #[error(transparent)]
  Ninja(#[from] NinjaError),
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
  pub out_dir: PathBuf,
  /// Appended to every module's invocation.
  pub link_flags: Vec<String>,
  /// Compiler driver named in invocations.
  pub tool: String,
}

impl GenerateOptions {
  pub fn new(out_dir: impl Into<PathBuf>) -> Self {
    Self {
      out_dir: out_dir.into(),
      link_flags: Vec::new(),
      tool: DEFAULT_TOOL.to_string(),
    }
  }
}

/// What a generation run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
  pub path: PathBuf,
  pub targets: usize,
  pub actions: usize,
}

/// Resolve `root`, plan every target in its closure and write
/// `<out_dir>/build.ninja`.
pub async fn generate(
  resolver: &Resolver,
  root: &Label,
  options: &GenerateOptions,
  planner: &dyn ToolchainPlanner,
) -> Result<GenerateSummary, GenerateError> {
  let graph = resolver.closure(root).await?;
  let (writer, actions) = emit(&graph, resolver.root(), options, planner)?;

  let path = options.out_dir.join(BUILD_NINJA);
  writer.write(&path)?;

  info!(
    path = %path.display(),
    targets = graph.len(),
    actions,
    "generated build file"
  );
  Ok(GenerateSummary {
    path,
    targets: graph.len(),
    actions,
  })
}

/// [`generate`] with the default `swiftc` planner and options.
pub async fn build(
  resolver: &Resolver,
  root: &Label,
  out_dir: &Path,
) -> Result<GenerateSummary, GenerateError> {
  generate(resolver, root, &GenerateOptions::new(out_dir), &SwiftcPlanner).await
}

/// Render the build file for `graph`, returning it with the number of
/// actions emitted.
///
/// A config root is rejected: it emits no edges, so `default` would name an
/// output nothing produces.
pub fn emit(
  graph: &BuildGraph,
  root: &Path,
  options: &GenerateOptions,
  planner: &dyn ToolchainPlanner,
) -> Result<(NinjaWriter, usize), GenerateError> {
  if graph.get(&graph.root).is_some_and(|target| target.kind == TargetKind::Config) {
    return Err(GenerateError::ConfigRoot(graph.root.clone()));
  }

  let mut writer = NinjaWriter::new();
  writer.comment("Generated by sb; do not edit.");
  writer.variable("ninja_required_version", "1.10");
  writer.newline();

  for kind in ActionKind::ALL {
    let mut rule = Rule::new(kind.rule_name(), "$cmd").description("$desc");
    if matches!(kind, ActionKind::Compile | ActionKind::EmitInterface) {
      rule = rule.restat();
    }
    writer.rule(&rule);
  }

  let mut actions = 0;
  for target in graph.ordered() {
    match target.kind {
      TargetKind::Config => {}
      TargetKind::Group => emit_group(&mut writer, target, graph, root),
      _ => actions += emit_module(&mut writer, target, graph, root, options, planner)?,
    }
  }

  writer.newline();
  writer.default(&[graph.root.alias(root)]);
  Ok((writer, actions))
}

fn emit_group(writer: &mut NinjaWriter, target: &Target, graph: &BuildGraph, root: &Path) {
  let members: Vec<String> = target
    .dependencies
    .iter()
    .filter(|label| {
      graph
        .get(label)
        .is_some_and(|dependency| dependency.kind != TargetKind::Config)
    })
    .map(|label| label.alias(root))
    .collect();
  writer.phony(&target.label.alias(root), &members);
  writer.newline();
}

fn emit_module(
  writer: &mut NinjaWriter,
  target: &Target,
  graph: &BuildGraph,
  root: &Path,
  options: &GenerateOptions,
  planner: &dyn ToolchainPlanner,
) -> Result<usize, GenerateError> {
  let invocation = Invocation::new(target, graph, root, &options.tool, &options.link_flags);
  let Some(invocation) = invocation else {
    return Ok(0);
  };
  let actions = planner.plan(&invocation).map_err(|source| GenerateError::Plan {
    label: target.label.clone(),
    source,
  })?;
  debug!(target = %target.label, actions = actions.len(), "planned module");

  let dependencies = module_dependencies(target, graph, root);
  let interfaces: Vec<String> = dependencies.iter().filter_map(|d| d.interface.clone()).collect();
  let libraries: Vec<String> = dependencies.iter().filter_map(|d| d.library.clone()).collect();

  let mut products = Vec::new();
  for action in &actions {
    let build = match action.kind {
      ActionKind::Compile | ActionKind::EmitInterface => {
        edge(action, action.inputs.clone()).implicit_inputs(interfaces.clone())
      }
      ActionKind::Link => {
        let explicit = action
          .inputs
          .iter()
          .filter(|input| !libraries.contains(input))
          .cloned()
          .collect();
        edge(action, explicit).implicit_inputs(libraries.clone())
      }
      ActionKind::MergeInterface | ActionKind::Other => edge(action, action.inputs.clone()),
    };
    writer.build(&build);

    if matches!(
      action.kind,
      ActionKind::Link | ActionKind::EmitInterface | ActionKind::MergeInterface
    ) {
      products.extend(action.outputs.iter().cloned());
    }
  }

  writer.phony(&invocation.alias, &products);
  writer.newline();
  Ok(actions.len())
}

fn edge(action: &BuildAction, inputs: Vec<String>) -> Build {
  Build::new(action.outputs.clone(), action.kind.rule_name(), inputs)
    .variable("cmd", escape_value(&shell_join(&action.command)))
    .variable("desc", escape_value(&action.description))
}
