//! Turning a finished rule scope into a [`Target`].
//!
//! Attributes are read from the rule scope's own bindings; the enclosing
//! scopes are only consulted for `host_os`.

use std::path::PathBuf;

use tracing::debug;

use crate::label::{Label, normalize};
use crate::parser::Span;
use crate::platform::Os;
use crate::target::{Dependencies, Flags, Module, Target, TargetKind};

use super::ExecutionError;
use super::scope::Scope;
use super::value::Value;
use super::variables::Variable;

/// Reads typed attributes out of a rule scope, blaming errors on `span`.
struct Attributes<'s, 'p> {
  scope: &'s Scope<'p>,
  span: Span,
}

impl Attributes<'_, '_> {
  fn string(&self, name: &str) -> Result<Option<String>, ExecutionError> {
    match self.scope.get_own(name) {
      None => Ok(None),
      Some(Value::String(value)) => Ok(Some(value.clone())),
      Some(other) => Err(self.mismatch(name, "string", other)),
    }
  }

  fn strings(&self, name: &str) -> Result<Vec<String>, ExecutionError> {
    match self.scope.get_own(name) {
      None => Ok(Vec::new()),
      Some(value) => value.as_string_list().ok_or_else(|| self.mismatch(name, "[string]", value)),
    }
  }

  fn labels(&self, name: &str) -> Result<Vec<Label>, ExecutionError> {
    self
      .strings(name)?
      .iter()
      .map(|reference| {
        Label::resolve_in(reference, self.scope.root(), self.scope.directory()).map_err(|err| {
          ExecutionError::new(format!("invalid label in '{}': {}", name, err), Some(self.span))
        })
      })
      .collect()
  }

  fn paths(&self, name: &str) -> Result<Vec<PathBuf>, ExecutionError> {
    Ok(
      self
        .strings(name)?
        .iter()
        .map(|path| normalize(&self.scope.directory().join(path)))
        .collect(),
    )
  }

  fn target_name(&self) -> Result<String, ExecutionError> {
    self
      .string(Variable::TargetName.name())?
      .ok_or_else(|| ExecutionError::new("'target_name' is not defined", Some(self.span)))
  }

  fn host_os(&self) -> Result<Os, ExecutionError> {
    let name = Variable::HostOs.name();
    match self.scope.get(name) {
      Some(Value::String(value)) => value.parse().map_err(|err: String| {
        ExecutionError::new(format!("invalid '{}': {}", name, err), Some(self.span))
      }),
      Some(other) => Err(self.mismatch(name, "string", other)),
      None => Err(ExecutionError::new(format!("'{}' is not defined", name), Some(self.span))),
    }
  }

  fn dependencies(&self) -> Result<Dependencies, ExecutionError> {
    Ok(Dependencies {
      private: self.labels("deps")?,
      public: self.labels("public_deps")?,
    })
  }

  fn flags(&self) -> Result<Flags, ExecutionError> {
    Ok(Flags {
      defines: self.strings("defines")?,
      include_dirs: self.paths("include_dirs")?,
      libs: self.strings("libs")?,
      swiftflags: self.strings("swiftflags")?,
    })
  }

  fn mismatch(&self, name: &str, expected: &str, found: &Value) -> ExecutionError {
    ExecutionError::new(
      format!("'{}' must be of type {}, found {}", name, expected, found.type_name()),
      Some(self.span),
    )
  }
}

fn label_for(scope: &Scope<'_>, name: &str) -> Label {
  Label::new(scope.directory(), name)
}

/// Reify an executable or library declared in `scope`.
pub(crate) fn module(
  kind: TargetKind,
  scope: &Scope<'_>,
  span: Span,
) -> Result<Target, ExecutionError> {
  let attributes = Attributes { scope, span };
  let name = attributes.target_name()?;
  let host_os = attributes.host_os()?;

  let default_extension = match kind {
    TargetKind::StaticLibrary => host_os.static_library_extension(),
    TargetKind::DynamicLibrary => host_os.dynamic_library_extension(),
    _ => host_os.executable_extension(),
  };

  let module = Module {
    module_name: attributes.string("module_name")?.unwrap_or_else(|| name.clone()),
    output_name: attributes.string("output_name")?.unwrap_or_else(|| name.clone()),
    output_extension: attributes
      .string("output_extension")?
      .unwrap_or_else(|| default_extension.to_string()),
    sources: attributes.paths("sources")?,
    configs: attributes.labels("configs")?,
  };

  let target = Target {
    label: label_for(scope, &name),
    kind,
    dependencies: attributes.dependencies()?,
    flags: attributes.flags()?,
    module: Some(module),
  };
  debug!(target = %target.label, kind = kind.builtin(), "declared target");
  Ok(target)
}

pub(crate) fn group(scope: &Scope<'_>, span: Span) -> Result<Target, ExecutionError> {
  let attributes = Attributes { scope, span };
  let name = attributes.target_name()?;

  let target = Target {
    label: label_for(scope, &name),
    kind: TargetKind::Group,
    dependencies: attributes.dependencies()?,
    flags: Flags::default(),
    module: None,
  };
  debug!(target = %target.label, kind = "group", "declared target");
  Ok(target)
}

pub(crate) fn config(scope: &Scope<'_>, span: Span) -> Result<Target, ExecutionError> {
  let attributes = Attributes { scope, span };
  let name = attributes.target_name()?;

  let target = Target {
    label: label_for(scope, &name),
    kind: TargetKind::Config,
    dependencies: Dependencies::default(),
    flags: attributes.flags()?,
    module: None,
  };
  debug!(target = %target.label, kind = "config", "declared target");
  Ok(target)
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use super::*;
  use crate::platform::{Arch, Platform};

  fn scope_on(os: Os) -> Scope<'static> {
    Scope::with_platform("/w/app", "/w", Some(Platform::new(Arch::X86_64, os)))
  }

  fn rule_scope<'p>(parent: &'p Scope<'p>, name: &str) -> Scope<'p> {
    let mut child = parent.child(parent.directory().to_path_buf());
    child.set("target_name", Value::from(name));
    child
  }

  #[test]
  fn module_defaults_follow_host_os() {
    let root = scope_on(Os::Windows);
    let scope = rule_scope(&root, "core");
    let target = module(TargetKind::DynamicLibrary, &scope, Span::default()).unwrap();
    let module = target.module.unwrap();

    assert_eq!(target.label, Label::new("/w/app", "core"));
    assert_eq!(module.output_name, "core");
    assert_eq!(module.module_name, "core");
    assert_eq!(module.output_extension, "dll");
  }

  #[test]
  fn executables_have_no_extension_on_linux() {
    let root = scope_on(Os::Linux);
    let scope = rule_scope(&root, "app");
    let target = module(TargetKind::Executable, &scope, Span::default()).unwrap();
    assert_eq!(target.module.unwrap().output_file_name(), "app");
  }

  #[test]
  fn sources_and_deps_are_resolved() {
    let root = scope_on(Os::Linux);
    let mut scope = rule_scope(&root, "app");
    scope.set("sources", Value::from(vec!["main.swift", "../shared/util.swift"]));
    scope.set("deps", Value::from(vec![":lib", "//base:log"]));
    scope.set("public_deps", Value::from(vec!["//api"]));

    let target = module(TargetKind::Executable, &scope, Span::default()).unwrap();
    let module = target.module.as_ref().unwrap();
    assert_eq!(
      module.sources,
      vec![
        Path::new("/w/app/main.swift").to_path_buf(),
        Path::new("/w/shared/util.swift").to_path_buf(),
      ]
    );
    assert_eq!(
      target.dependencies.private,
      vec![Label::new("/w/app", "lib"), Label::new("/w/base", "log")]
    );
    assert_eq!(target.dependencies.public, vec![Label::new("/w", "api")]);
  }

  #[test]
  fn attributes_are_read_from_own_bindings() {
    let mut root = scope_on(Os::Linux);
    root.set("output_name", Value::from("inherited"));
    let scope = rule_scope(&root, "app");
    let target = module(TargetKind::Executable, &scope, Span::default()).unwrap();
    assert_eq!(target.module.unwrap().output_name, "app");
  }

  #[test]
  fn non_string_elements_name_the_attribute() {
    let root = scope_on(Os::Linux);
    let mut scope = rule_scope(&root, "app");
    scope.set("sources", Value::List(vec![Value::from("a.swift"), Value::from(1i64)]));

    let err = module(TargetKind::Executable, &scope, Span::default()).unwrap_err();
    assert!(err.message.contains("'sources'"), "{}", err);
    assert!(err.message.contains("[string]"), "{}", err);
  }

  #[test]
  fn missing_host_os_is_an_error() {
    let root = Scope::with_platform("/w", "/w", None);
    let scope = rule_scope(&root, "app");
    let err = module(TargetKind::StaticLibrary, &scope, Span::default()).unwrap_err();
    assert!(err.message.contains("host_os"));
  }

  #[test]
  fn config_carries_flags() {
    let root = scope_on(Os::Linux);
    let mut scope = rule_scope(&root, "warnings");
    scope.set("swiftflags", Value::from(vec!["-warnings-as-errors"]));
    scope.set("include_dirs", Value::from(vec!["include"]));

    let target = config(&scope, Span::default()).unwrap();
    assert_eq!(target.kind, TargetKind::Config);
    assert_eq!(target.flags.swiftflags, vec!["-warnings-as-errors"]);
    assert_eq!(target.flags.include_dirs, vec![Path::new("/w/app/include").to_path_buf()]);
  }
}
