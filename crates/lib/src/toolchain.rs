//! The seam between resolved targets and concrete compiler commands.
//!
//! The generator turns each module into an [`Invocation`], a flat `swiftc`
//! style argument vector, and hands it to a [`ToolchainPlanner`] which
//! answers with the [`BuildAction`]s needed to produce the module.
//! [`SwiftcPlanner`] is the planner used by default.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::resolver::BuildGraph;
use crate::target::{Flags, Target, TargetKind};

/// Compiler driver used when none is configured.
pub const DEFAULT_TOOL: &str = "swiftc";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
  #[error("invocation for '{0}' is empty")]
  Empty(String),

  #[error("invocation for '{alias}' is missing {argument}")]
  MissingArgument { alias: String, argument: &'static str },

  #[error("'{flag}' in invocation for '{alias}' expects a value")]
  MissingValue { alias: String, flag: String },

  #[error("module '{0}' has no sources")]
  NoSources(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
  Compile,
  Link,
  EmitInterface,
  MergeInterface,
  Other,
}

impl ActionKind {
  /// Name of the build-file rule used for this kind of action.
  pub fn rule_name(&self) -> &'static str {
    match self {
      ActionKind::Compile => "swift_compile",
      ActionKind::Link => "swift_link",
      ActionKind::EmitInterface => "swift_emit_module",
      ActionKind::MergeInterface => "swift_merge_module",
      ActionKind::Other => "command",
    }
  }

  pub const ALL: [ActionKind; 5] = [
    ActionKind::Compile,
    ActionKind::EmitInterface,
    ActionKind::MergeInterface,
    ActionKind::Link,
    ActionKind::Other,
  ];
}

/// One compiler or linker step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildAction {
  pub kind: ActionKind,
  pub description: String,
  pub inputs: Vec<String>,
  pub outputs: Vec<String>,
  /// Argument vector, tool first.
  pub command: Vec<String>,
}

/// A module this target compiles against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDependency {
  pub alias: String,
  pub module_name: String,
  /// Compiled module interface, for libraries.
  pub interface: Option<String>,
  /// Library to link, for libraries.
  pub library: Option<String>,
}

impl ModuleDependency {
  pub fn search_path(&self) -> String {
    format!("{}.dir/swift", self.alias)
  }
}

/// Output path of a module relative to the output directory.
pub fn output_path(target: &Target) -> Option<String> {
  let module = target.module.as_ref()?;
  let directory = if target.kind == TargetKind::Executable { "bin" } else { "lib" };
  Some(format!("{}/{}", directory, module.output_file_name()))
}

/// Path of the `.swiftmodule` a library emits.
pub fn interface_path(alias: &str, module_name: &str) -> String {
  format!("{}.dir/swift/{}.swiftmodule", alias, module_name)
}

/// Modules reachable from `target` through dependency edges, in discovery
/// order. Groups are looked through; configs are skipped.
pub fn module_dependencies(
  target: &Target,
  graph: &BuildGraph,
  root: &Path,
) -> Vec<ModuleDependency> {
  let mut seen = std::collections::HashSet::new();
  let mut stack: Vec<_> = target.dependencies.iter().rev().cloned().collect();
  let mut found = Vec::new();

  while let Some(label) = stack.pop() {
    if !seen.insert(label.clone()) {
      continue;
    }
    let Some(dependency) = graph.get(&label) else {
      continue;
    };
    stack.extend(dependency.dependencies.iter().rev().cloned());

    let Some(module) = &dependency.module else {
      continue;
    };
    let alias = label.alias(root);
    let is_library = dependency.kind.is_library();
    found.push(ModuleDependency {
      interface: is_library.then(|| interface_path(&alias, &module.module_name)),
      library: if is_library { output_path(dependency) } else { None },
      module_name: module.module_name.clone(),
      alias,
    });
  }
  found
}

/// Flags of `target` merged with the flags of every config it lists.
pub fn effective_flags(target: &Target, graph: &BuildGraph) -> Flags {
  let mut flags = target.flags.clone();
  if let Some(module) = &target.module {
    for label in &module.configs {
      if let Some(config) = graph.get(label) {
        flags.merge(&config.flags);
      }
    }
  }
  flags
}

/// Compiler-driver arguments for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
  /// Workspace-unique key; intermediate files live under `<alias>.dir/`.
  pub alias: String,
  pub arguments: Vec<String>,
}

impl Invocation {
  /// Build the invocation for a module target. Returns `None` for groups and
  /// configs.
  pub fn new(
    target: &Target,
    graph: &BuildGraph,
    root: &Path,
    tool: &str,
    link_flags: &[String],
  ) -> Option<Self> {
    let module = target.module.as_ref()?;
    let alias = target.label.alias(root);
    let flags = effective_flags(target, graph);
    let dependencies = module_dependencies(target, graph, root);

    let mut arguments = vec![tool.to_string()];
    match target.kind {
      TargetKind::Executable => arguments.push("-emit-executable".into()),
      TargetKind::StaticLibrary => arguments.extend(
        ["-emit-library", "-static", "-emit-module", "-parse-as-library"].map(String::from),
      ),
      _ => arguments.extend(
        ["-emit-library", "-emit-module", "-parse-as-library"].map(String::from),
      ),
    }
    arguments.extend(["-module-name".to_string(), module.module_name.clone()]);
    arguments.extend(["-o".to_string(), output_path(target)?]);

    for define in &flags.defines {
      arguments.extend(["-D".to_string(), define.clone()]);
    }
    for dependency in &dependencies {
      if dependency.interface.is_some() {
        arguments.extend(["-I".to_string(), dependency.search_path()]);
      }
    }
    for directory in &flags.include_dirs {
      arguments.extend(["-I".to_string(), directory.to_string_lossy().into_owned()]);
    }
    arguments.extend(module.sources.iter().map(|source| source.to_string_lossy().into_owned()));
    arguments.extend(flags.libs.iter().map(|lib| format!("-l{}", lib)));
    arguments.extend(dependencies.iter().filter_map(|dependency| dependency.library.clone()));
    arguments.extend(link_flags.iter().cloned());
    arguments.extend(flags.swiftflags.iter().cloned());

    Some(Self { alias, arguments })
  }
}

/// Turns an invocation into build actions.
pub trait ToolchainPlanner: Send + Sync {
  fn plan(&self, invocation: &Invocation) -> Result<Vec<BuildAction>, PlanError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Product {
  Executable,
  StaticLibrary,
  DynamicLibrary,
}

/// Pass-through flags whose next argument is their value rather than an input.
const VALUE_FLAGS: &[&str] = &[
  "-target",
  "-target-variant",
  "-sdk",
  "-resource-dir",
  "-module-cache-path",
  "-swift-version",
  "-vfsoverlay",
  "-num-threads",
  "-j",
  "-F",
  "-L",
  "-Xcc",
  "-Xclang-linker",
  "-Xfrontend",
  "-Xlinker",
  "-Xllvm",
];

/// An invocation broken back down into its parts.
#[derive(Debug, Default)]
struct ParsedInvocation {
  tool: String,
  emit_executable: bool,
  emit_library: bool,
  static_library: bool,
  emit_module: bool,
  parse_as_library: bool,
  module_name: Option<String>,
  output: Option<String>,
  defines: Vec<String>,
  search_paths: Vec<String>,
  sources: Vec<String>,
  libraries: Vec<String>,
  link_inputs: Vec<String>,
  extra: Vec<String>,
}

impl ParsedInvocation {
  fn parse(invocation: &Invocation) -> Result<Self, PlanError> {
    let alias = &invocation.alias;
    let mut arguments = invocation.arguments.iter();
    let mut parsed = ParsedInvocation {
      tool: arguments.next().cloned().ok_or_else(|| PlanError::Empty(alias.clone()))?,
      ..Default::default()
    };

    let value = |flag: &str, next: Option<&String>| {
      next.cloned().ok_or_else(|| PlanError::MissingValue {
        alias: alias.clone(),
        flag: flag.to_string(),
      })
    };

    while let Some(argument) = arguments.next() {
      match argument.as_str() {
        "-emit-executable" => parsed.emit_executable = true,
        "-emit-library" => parsed.emit_library = true,
        "-static" => parsed.static_library = true,
        "-emit-module" => parsed.emit_module = true,
        "-parse-as-library" => parsed.parse_as_library = true,
        "-module-name" => parsed.module_name = Some(value(argument, arguments.next())?),
        "-o" => parsed.output = Some(value(argument, arguments.next())?),
        "-D" => parsed.defines.push(value(argument, arguments.next())?),
        "-I" => parsed.search_paths.push(value(argument, arguments.next())?),
        lib if lib.starts_with("-l") && lib.len() > 2 => parsed.libraries.push(lib.to_string()),
        flag if VALUE_FLAGS.contains(&flag) => {
          parsed.extra.push(flag.to_string());
          parsed.extra.push(value(argument, arguments.next())?);
        }
        flag if flag.starts_with('-') => parsed.extra.push(flag.to_string()),
        source if source.ends_with(".swift") => parsed.sources.push(source.to_string()),
        input => parsed.link_inputs.push(input.to_string()),
      }
    }
    Ok(parsed)
  }

  fn product(&self) -> Product {
    match (self.emit_library, self.static_library) {
      (true, true) => Product::StaticLibrary,
      (true, false) => Product::DynamicLibrary,
      _ => Product::Executable,
    }
  }

  /// Arguments shared by compile and emit-module steps.
  fn frontend_arguments(&self, module_name: &str) -> Vec<String> {
    let mut arguments = Vec::new();
    if self.parse_as_library {
      arguments.push("-parse-as-library".to_string());
    }
    arguments.extend(["-module-name".to_string(), module_name.to_string()]);
    for define in &self.defines {
      arguments.extend(["-D".to_string(), define.clone()]);
    }
    for path in &self.search_paths {
      arguments.extend(["-I".to_string(), path.clone()]);
    }
    arguments.extend(self.extra.iter().cloned());
    arguments.extend(self.sources.iter().cloned());
    arguments
  }
}

/// Whole-module `swiftc` builds: one compile, one module emission for
/// libraries, and one link.
#[derive(Debug, Clone, Default)]
pub struct SwiftcPlanner;

impl ToolchainPlanner for SwiftcPlanner {
  fn plan(&self, invocation: &Invocation) -> Result<Vec<BuildAction>, PlanError> {
    let parsed = ParsedInvocation::parse(invocation)?;
    let alias = &invocation.alias;
    let module_name = parsed.module_name.clone().ok_or_else(|| PlanError::MissingArgument {
      alias: alias.clone(),
      argument: "-module-name",
    })?;
    let output = parsed.output.clone().ok_or_else(|| PlanError::MissingArgument {
      alias: alias.clone(),
      argument: "-o",
    })?;
    if parsed.sources.is_empty() {
      return Err(PlanError::NoSources(module_name));
    }

    let object = format!("{}.dir/{}.o", alias, module_name);
    let mut actions = Vec::new();

    let mut command = vec![parsed.tool.clone(), "-c".to_string(), "-wmo".to_string()];
    command.extend(parsed.frontend_arguments(&module_name));
    command.extend(["-o".to_string(), object.clone()]);
    actions.push(BuildAction {
      kind: ActionKind::Compile,
      description: format!("Compiling {}", module_name),
      inputs: parsed.sources.clone(),
      outputs: vec![object.clone()],
      command,
    });

    if parsed.emit_module {
      let interface = interface_path(alias, &module_name);
      let mut command = vec![parsed.tool.clone(), "-emit-module".to_string()];
      command.extend(parsed.frontend_arguments(&module_name));
      command.extend(["-emit-module-path".to_string(), interface.clone()]);
      actions.push(BuildAction {
        kind: ActionKind::EmitInterface,
        description: format!("Emitting module {}", module_name),
        inputs: parsed.sources.clone(),
        outputs: vec![interface],
        command,
      });
    }

    let mut command = vec![parsed.tool.clone()];
    let mut inputs = vec![object.clone()];
    match parsed.product() {
      Product::StaticLibrary => {
        command.extend(["-emit-library", "-static"].map(String::from));
        command.push(object);
      }
      product => {
        command.push(
          if product == Product::DynamicLibrary {
            "-emit-library"
          } else {
            "-emit-executable"
          }
          .to_string(),
        );
        command.extend(["-module-name".to_string(), module_name.clone()]);
        command.push(object);
        command.extend(parsed.link_inputs.iter().cloned());
        command.extend(parsed.libraries.iter().cloned());
        command.extend(parsed.extra.iter().cloned());
        inputs.extend(parsed.link_inputs.iter().cloned());
      }
    }
    command.extend(["-o".to_string(), output.clone()]);
    actions.push(BuildAction {
      kind: ActionKind::Link,
      description: format!("Linking {}", output),
      inputs,
      outputs: vec![output],
      command,
    });

    Ok(actions)
  }
}

/// Join an argument vector into a POSIX shell command line.
pub fn shell_join(arguments: &[String]) -> String {
  arguments
    .iter()
    .map(|argument| {
      let plain = !argument.is_empty()
        && argument
          .chars()
          .all(|c| c.is_ascii_alphanumeric() || "-_./=+,:@%$".contains(c));
      if plain {
        argument.clone()
      } else {
        format!("'{}'", argument.replace('\'', "'\\''"))
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;
  use std::path::PathBuf;
  use std::sync::Arc;

  use super::*;
  use crate::label::Label;
  use crate::target::{Dependencies, Module};

  fn module(directory: &str, name: &str, kind: TargetKind, deps: Vec<Label>) -> Target {
    Target {
      label: Label::new(directory, name),
      kind,
      dependencies: Dependencies {
        private: deps,
        public: vec![],
      },
      flags: Flags::default(),
      module: Some(Module {
        module_name: name.to_string(),
        output_name: name.to_string(),
        output_extension: match kind {
          TargetKind::StaticLibrary => "a".to_string(),
          TargetKind::DynamicLibrary => "so".to_string(),
          _ => String::new(),
        },
        sources: vec![PathBuf::from(format!("{}/{}.swift", directory, name))],
        configs: vec![],
      }),
    }
  }

  fn graph(root: &Label, targets: Vec<Target>) -> BuildGraph {
    BuildGraph {
      root: root.clone(),
      targets: targets
        .into_iter()
        .map(|target| (target.label.clone(), Arc::new(target)))
        .collect::<BTreeMap<_, _>>(),
      expansions: 0,
    }
  }

  #[test]
  fn invocation_for_executable_with_library() {
    let lib = module("/w/base", "Base", TargetKind::StaticLibrary, vec![]);
    let mut app = module("/w/app", "App", TargetKind::Executable, vec![lib.label.clone()]);
    app.flags.defines.push("DEBUG".into());
    app.flags.libs.push("m".into());
    let graph = graph(&app.label, vec![lib, app.clone()]);

    let link_flags = ["-Xlinker", "-dead_strip"].map(String::from);
    let invocation =
      Invocation::new(&app, &graph, Path::new("/w"), DEFAULT_TOOL, &link_flags).unwrap();

    assert_eq!(invocation.alias, "app/App");
    assert_eq!(
      invocation.arguments,
      vec![
        "swiftc",
        "-emit-executable",
        "-module-name",
        "App",
        "-o",
        "bin/App",
        "-D",
        "DEBUG",
        "-I",
        "base/Base.dir/swift",
        "/w/app/App.swift",
        "-lm",
        "lib/Base.a",
        "-Xlinker",
        "-dead_strip",
      ]
    );
  }

  #[test]
  fn groups_have_no_invocation() {
    let group = Target {
      label: Label::new("/w", "all"),
      kind: TargetKind::Group,
      dependencies: Dependencies::default(),
      flags: Flags::default(),
      module: None,
    };
    let graph = graph(&group.label, vec![group.clone()]);
    assert!(Invocation::new(&group, &graph, Path::new("/w"), DEFAULT_TOOL, &[]).is_none());
  }

  #[test]
  fn dependencies_are_found_through_groups() {
    let lib = module("/w/base", "Base", TargetKind::DynamicLibrary, vec![]);
    let group = Target {
      label: Label::new("/w/bundle", "bundle"),
      kind: TargetKind::Group,
      dependencies: Dependencies {
        private: vec![],
        public: vec![lib.label.clone()],
      },
      flags: Flags::default(),
      module: None,
    };
    let app = module("/w/app", "App", TargetKind::Executable, vec![group.label.clone()]);
    let graph = graph(&app.label, vec![lib, group, app.clone()]);

    let dependencies = module_dependencies(&app, &graph, Path::new("/w"));
    assert_eq!(dependencies.len(), 1);
    assert_eq!(dependencies[0].library.as_deref(), Some("lib/Base.so"));
    assert_eq!(
      dependencies[0].interface.as_deref(),
      Some("base/Base.dir/swift/Base.swiftmodule")
    );
  }

  #[test]
  fn config_flags_are_merged() {
    let config = Target {
      label: Label::new("/w", "strict"),
      kind: TargetKind::Config,
      dependencies: Dependencies::default(),
      flags: Flags {
        swiftflags: vec!["-warnings-as-errors".into()],
        ..Default::default()
      },
      module: None,
    };
    let mut app = module("/w", "App", TargetKind::Executable, vec![]);
    if let Some(module) = app.module.as_mut() {
      module.configs.push(config.label.clone());
    }
    let graph = graph(&app.label, vec![config, app.clone()]);

    let invocation = Invocation::new(&app, &graph, Path::new("/w"), DEFAULT_TOOL, &[]).unwrap();
    assert_eq!(invocation.arguments.last().map(String::as_str), Some("-warnings-as-errors"));
  }

  #[test]
  fn static_library_plan() {
    let invocation = Invocation {
      alias: "base/Base".into(),
      arguments: [
        "swiftc",
        "-emit-library",
        "-static",
        "-emit-module",
        "-parse-as-library",
        "-module-name",
        "Base",
        "-o",
        "lib/Base.a",
        "/w/base/Base.swift",
      ]
      .map(String::from)
      .to_vec(),
    };

    let actions = SwiftcPlanner.plan(&invocation).unwrap();
    let kinds: Vec<ActionKind> = actions.iter().map(|action| action.kind).collect();
    assert_eq!(kinds, vec![ActionKind::Compile, ActionKind::EmitInterface, ActionKind::Link]);

    assert_eq!(actions[0].outputs, vec!["base/Base.dir/Base.o"]);
    assert_eq!(actions[1].outputs, vec!["base/Base.dir/swift/Base.swiftmodule"]);
    assert_eq!(
      actions[2].command,
      vec!["swiftc", "-emit-library", "-static", "base/Base.dir/Base.o", "-o", "lib/Base.a"]
    );
  }

  #[test]
  fn executable_plan_links_dependencies() {
    let invocation = Invocation {
      alias: "app".into(),
      arguments: [
        "swiftc",
        "-emit-executable",
        "-module-name",
        "app",
        "-o",
        "bin/app",
        "-I",
        "base/Base.dir/swift",
        "/w/main.swift",
        "-lm",
        "lib/Base.a",
      ]
      .map(String::from)
      .to_vec(),
    };

    let actions = SwiftcPlanner.plan(&invocation).unwrap();
    assert_eq!(actions.len(), 2);
    let link = &actions[1];
    assert_eq!(link.kind, ActionKind::Link);
    assert_eq!(link.inputs, vec!["app.dir/app.o", "lib/Base.a"]);
    assert!(link.command.contains(&"-lm".to_string()));
    assert!(actions[0].command.contains(&"base/Base.dir/swift".to_string()));
  }

  #[test]
  fn flag_values_are_not_link_inputs() {
    let mut app = module("/w", "App", TargetKind::Executable, vec![]);
    app.flags.swiftflags = ["-target", "x86_64-unknown-linux-gnu", "-module-cache-path", "/tmp/mc"]
      .map(String::from)
      .to_vec();
    let graph = graph(&app.label, vec![app.clone()]);
    let invocation = Invocation::new(&app, &graph, Path::new("/w"), DEFAULT_TOOL, &[]).unwrap();

    let actions = SwiftcPlanner.plan(&invocation).unwrap();
    let link = &actions[1];
    assert_eq!(link.kind, ActionKind::Link);
    assert_eq!(link.inputs, vec!["App.dir/App.o"]);
    for command in [&actions[0].command, &link.command] {
      let target = command.iter().position(|argument| argument == "-target").unwrap();
      assert_eq!(command[target + 1], "x86_64-unknown-linux-gnu");
      let cache = command.iter().position(|argument| argument == "-module-cache-path").unwrap();
      assert_eq!(command[cache + 1], "/tmp/mc");
    }
  }

  #[test]
  fn value_flag_without_value_is_rejected() {
    let invocation = Invocation {
      alias: "x".into(),
      arguments: ["swiftc", "-module-name", "X", "-o", "bin/x", "/w/x.swift", "-target"]
        .map(String::from)
        .to_vec(),
    };
    assert_eq!(
      SwiftcPlanner.plan(&invocation),
      Err(PlanError::MissingValue {
        alias: "x".into(),
        flag: "-target".into()
      })
    );
  }

  #[test]
  fn plan_rejects_incomplete_invocations() {
    let invocation = Invocation {
      alias: "x".into(),
      arguments: vec!["swiftc".into(), "-module-name".into()],
    };
    assert_eq!(
      SwiftcPlanner.plan(&invocation),
      Err(PlanError::MissingValue {
        alias: "x".into(),
        flag: "-module-name".into()
      })
    );

    let invocation = Invocation {
      alias: "x".into(),
      arguments: ["swiftc", "-module-name", "X", "-o", "bin/x"].map(String::from).to_vec(),
    };
    assert_eq!(SwiftcPlanner.plan(&invocation), Err(PlanError::NoSources("X".into())));
  }

  #[test]
  fn shell_join_quotes_when_needed() {
    let arguments = ["swiftc", "/w/my file.swift", "-DNAME=it's"].map(String::from);
    assert_eq!(shell_join(&arguments), "swiftc '/w/my file.swift' '-DNAME=it'\\''s'");
  }
}
