//! Reified build targets.
//!
//! Targets are immutable records produced when a rule builtin finishes
//! evaluating its block. They outlive the scope they came from and are cached
//! by the resolver.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::label::Label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
  StaticLibrary,
  DynamicLibrary,
  Executable,
  Group,
  /// A named set of flags that modules opt into via `configs`.
  Config,
}

impl TargetKind {
  /// The builtin function that declares this kind of target.
  pub fn builtin(&self) -> &'static str {
    match self {
      TargetKind::StaticLibrary => "static_library",
      TargetKind::DynamicLibrary => "shared_library",
      TargetKind::Executable => "executable",
      TargetKind::Group => "group",
      TargetKind::Config => "config",
    }
  }

  pub fn is_module(&self) -> bool {
    matches!(
      self,
      TargetKind::StaticLibrary | TargetKind::DynamicLibrary | TargetKind::Executable
    )
  }

  pub fn is_library(&self) -> bool {
    matches!(self, TargetKind::StaticLibrary | TargetKind::DynamicLibrary)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dependencies {
  pub private: Vec<Label>,
  pub public: Vec<Label>,
}

impl Dependencies {
  /// Public dependencies first, then private ones.
  pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Label> {
    self.public.iter().chain(self.private.iter())
  }

  pub fn is_empty(&self) -> bool {
    self.private.is_empty() && self.public.is_empty()
  }
}

/// Compiler and linker settings carried by modules and configs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Flags {
  pub defines: Vec<String>,
  pub include_dirs: Vec<PathBuf>,
  pub libs: Vec<String>,
  pub swiftflags: Vec<String>,
}

impl Flags {
  pub fn merge(&mut self, other: &Flags) {
    self.defines.extend(other.defines.iter().cloned());
    self.include_dirs.extend(other.include_dirs.iter().cloned());
    self.libs.extend(other.libs.iter().cloned());
    self.swiftflags.extend(other.swiftflags.iter().cloned());
  }
}

/// The compiled-module part of library and executable targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
  pub module_name: String,
  pub output_name: String,
  pub output_extension: String,
  /// Absolute paths.
  pub sources: Vec<PathBuf>,
  pub configs: Vec<Label>,
}

impl Module {
  /// `output_name` with the extension appended when there is one.
  pub fn output_file_name(&self) -> String {
    if self.output_extension.is_empty() {
      self.output_name.clone()
    } else {
      format!("{}.{}", self.output_name, self.output_extension)
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
  pub label: Label,
  pub kind: TargetKind,
  pub dependencies: Dependencies,
  pub flags: Flags,
  /// Present exactly for module kinds.
  pub module: Option<Module>,
}

impl Target {
  /// Every label this target needs resolved: dependencies, then configs.
  pub fn dependency_labels(&self) -> Vec<Label> {
    let mut labels: Vec<Label> = self.dependencies.iter().cloned().collect();
    if let Some(module) = &self.module {
      labels.extend(module.configs.iter().cloned());
    }
    labels
  }

  pub fn directory(&self) -> &Path {
    &self.label.directory
  }

  pub fn name(&self) -> &str {
    &self.label.name
  }
}
