//! Lexical environments.
//!
//! Scopes form a strict tree for the duration of one description file's
//! evaluation. A child borrows its parent, so a parent always outlives the
//! children created while its block runs. Every scope of one file shares the
//! same [`TargetCollector`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::platform::Platform;
use crate::target::Target;

use super::template::Template;
use super::value::{ScopeRef, Value};
use super::variables::default_variables;

/// Append-only list of the targets declared while evaluating one file.
#[derive(Debug, Clone, Default)]
pub struct TargetCollector(Rc<RefCell<Vec<Target>>>);

impl TargetCollector {
  pub fn append(&self, target: Target) {
    self.0.borrow_mut().push(target);
  }

  pub fn len(&self) -> usize {
    self.0.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.borrow().is_empty()
  }

  /// A copy of the collected targets in declaration order.
  pub fn targets(&self) -> Vec<Target> {
    self.0.borrow().clone()
  }

  /// Move the collected targets out, leaving the collector empty.
  pub fn take(&self) -> Vec<Target> {
    std::mem::take(&mut *self.0.borrow_mut())
  }
}

#[derive(Debug)]
pub struct Scope<'p> {
  parent: Option<&'p Scope<'p>>,
  directory: PathBuf,
  /// Workspace root used for `//` label references.
  root: PathBuf,
  values: HashMap<String, Value>,
  templates: HashMap<String, Rc<Template>>,
  collector: TargetCollector,
  /// Number of ancestors.
  depth: usize,

  /// Set while an import is processed; only variables, defaults and
  /// templates may be defined.
  pub importing: bool,
  /// Set while a build configuration is processed; targets may not be
  /// declared.
  pub configuring: bool,
}

impl Scope<'static> {
  /// Create a root scope seeded with the platform defaults of the host.
  pub fn new(directory: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
    Self::with_platform(directory, root, Platform::current())
  }

  /// Create a root scope seeded with the defaults for `platform`.
  pub fn with_platform(
    directory: impl Into<PathBuf>,
    root: impl Into<PathBuf>,
    platform: Option<Platform>,
  ) -> Self {
    let values = default_variables(platform)
      .into_iter()
      .map(|(name, value)| (name.to_string(), value))
      .collect();

    Self {
      parent: None,
      directory: directory.into(),
      root: root.into(),
      values,
      templates: HashMap::new(),
      collector: TargetCollector::default(),
      depth: 0,
      importing: false,
      configuring: false,
    }
  }
}

impl<'p> Scope<'p> {
  /// Create a child scope. Import and configuration gating is inherited.
  pub fn child(&self, directory: impl Into<PathBuf>) -> Scope<'_> {
    Scope {
      parent: Some(self),
      directory: directory.into(),
      root: self.root.clone(),
      values: HashMap::new(),
      templates: HashMap::new(),
      collector: self.collector.clone(),
      depth: self.depth + 1,
      importing: self.importing,
      configuring: self.configuring,
    }
  }

  pub fn parent(&self) -> Option<&Scope<'p>> {
    self.parent
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn depth(&self) -> usize {
    self.depth
  }

  pub fn collector(&self) -> &TargetCollector {
    &self.collector
  }

  /// Look a variable up through the parent chain.
  pub fn get(&self, name: &str) -> Option<&Value> {
    match self.values.get(name) {
      Some(value) => Some(value),
      None => self.parent.and_then(|parent| parent.get(name)),
    }
  }

  /// Look a variable up in this scope only.
  pub fn get_own(&self, name: &str) -> Option<&Value> {
    self.values.get(name)
  }

  pub fn set(&mut self, name: impl Into<String>, value: Value) {
    self.values.insert(name.into(), value);
  }

  pub fn template(&self, name: &str) -> Option<Rc<Template>> {
    match self.templates.get(name) {
      Some(template) => Some(template.clone()),
      None => self.parent.and_then(|parent| parent.template(name)),
    }
  }

  pub fn define_template(&mut self, template: Template) {
    self.templates.insert(template.name.clone(), Rc::new(template));
  }

  /// Freeze this scope's own bindings into a value.
  pub fn snapshot(&self) -> ScopeRef {
    ScopeRef::new(self.values.clone())
  }
}
