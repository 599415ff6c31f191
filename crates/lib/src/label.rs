//! Target labels.
//!
//! A label names a target by the directory holding its description file and
//! the name it was declared with. Textual references are resolved as follows:
//!
//! - `path:name` splits at the last `:`
//! - `path/name` (no `:`) splits at the last `/`
//! - `name` alone uses `name` as both the path and the name
//!
//! A path starting with `//` is rooted at the workspace root; any other path
//! is relative to the directory the reference appears in.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
  #[error("empty label reference")]
  Empty,

  #[error("label reference '{0}' does not name a target")]
  MissingName(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Label {
  pub directory: PathBuf,
  pub name: String,
}

impl Label {
  pub fn new(directory: impl Into<PathBuf>, name: impl Into<String>) -> Self {
    Self {
      directory: directory.into(),
      name: name.into(),
    }
  }

  /// Resolve `reference` using `root` both as the workspace root and as the
  /// directory relative references start from.
  pub fn resolve(reference: &str, root: &Path) -> Result<Self, LabelError> {
    Self::resolve_in(reference, root, root)
  }

  /// Resolve `reference` as it appears in a description file in `directory`.
  pub fn resolve_in(reference: &str, root: &Path, directory: &Path) -> Result<Self, LabelError> {
    if reference.is_empty() {
      return Err(LabelError::Empty);
    }

    let (path, name) = if let Some(index) = reference.rfind(':') {
      (&reference[..index], &reference[index + 1..])
    } else if let Some(index) = reference.rfind('/') {
      (&reference[..index], &reference[index + 1..])
    } else {
      (reference, reference)
    };

    if name.is_empty() {
      return Err(LabelError::MissingName(reference.to_string()));
    }

    // `//name` splits into `/` and `name`; both forms are rooted.
    let directory = if reference.starts_with("//") {
      root.join(path.get(2..).unwrap_or_default())
    } else if path.is_empty() {
      directory.to_path_buf()
    } else {
      directory.join(path)
    };

    Ok(Self::new(normalize(&directory), name))
  }

  /// The label as a workspace-relative reference (`//dir:name`).
  pub fn display_relative(&self, root: &Path) -> String {
    match self.directory.strip_prefix(root) {
      Ok(relative) => format!("//{}:{}", slashed(relative), self.name),
      Err(_) => self.to_string(),
    }
  }

  /// A path-like name that is unique per label inside the workspace.
  ///
  /// Used for generated directories and `phony` aliases.
  pub fn alias(&self, root: &Path) -> String {
    match self.directory.strip_prefix(root) {
      Ok(relative) if relative.as_os_str().is_empty() => self.name.clone(),
      Ok(relative) => format!("{}/{}", slashed(relative), self.name),
      Err(_) => format!("{}/{}", slashed(&self.directory).trim_start_matches('/'), self.name),
    }
  }
}

impl fmt::Display for Label {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.directory.display(), self.name)
  }
}

fn slashed(path: &Path) -> String {
  path
    .components()
    .filter_map(|component| match component {
      Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
      _ => None,
    })
    .collect::<Vec<_>>()
    .join("/")
}

/// Remove `.` and resolve `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !normalized.pop() {
          normalized.push(component);
        }
      }
      other => normalized.push(other),
    }
  }
  normalized
}

#[cfg(test)]
mod tests {
  use super::*;

  fn root() -> PathBuf {
    PathBuf::from("/work")
  }

  #[test]
  fn colon_reference_in_root() {
    let label = Label::resolve(":foo", &root()).unwrap();
    assert_eq!(label, Label::new("/work", "foo"));
  }

  #[test]
  fn rooted_reference_with_name() {
    let label = Label::resolve("//a/b:c", &root()).unwrap();
    assert_eq!(label, Label::new("/work/a/b", "c"));
  }

  #[test]
  fn rooted_reference_without_colon_splits_at_last_slash() {
    let label = Label::resolve("//a/b", &root()).unwrap();
    assert_eq!(label, Label::new("/work/a", "b"));
  }

  #[test]
  fn rooted_name_lives_in_root() {
    assert_eq!(Label::resolve("//tools", &root()).unwrap(), Label::new("/work", "tools"));
    assert_eq!(Label::resolve("//:all", &root()).unwrap(), Label::new("/work", "all"));
  }

  #[test]
  fn bare_reference_is_both_path_and_name() {
    let label = Label::resolve("lib", &root()).unwrap();
    assert_eq!(label, Label::new("/work/lib", "lib"));
  }

  #[test]
  fn relative_reference_uses_declaring_directory() {
    let label = Label::resolve_in("../util:strings", &root(), Path::new("/work/app")).unwrap();
    assert_eq!(label, Label::new("/work/util", "strings"));

    let label = Label::resolve_in(":local", &root(), Path::new("/work/app")).unwrap();
    assert_eq!(label, Label::new("/work/app", "local"));
  }

  #[test]
  fn malformed_references_are_errors() {
    assert_eq!(Label::resolve("", &root()), Err(LabelError::Empty));
    assert_eq!(
      Label::resolve("//a/b:", &root()),
      Err(LabelError::MissingName("//a/b:".to_string()))
    );
    assert!(Label::resolve("//a/", &root()).is_err());
  }

  #[test]
  fn ordering_is_directory_then_name() {
    let mut labels = vec![
      Label::new("/work/b", "a"),
      Label::new("/work/a", "z"),
      Label::new("/work/a", "b"),
    ];
    labels.sort();
    assert_eq!(
      labels,
      vec![
        Label::new("/work/a", "b"),
        Label::new("/work/a", "z"),
        Label::new("/work/b", "a"),
      ]
    );
  }

  #[test]
  fn relative_rendering() {
    let label = Label::new("/work/a/b", "c");
    assert_eq!(label.display_relative(&root()), "//a/b:c");
    assert_eq!(label.alias(&root()), "a/b/c");
    assert_eq!(Label::new("/work", "app").alias(&root()), "app");
  }
}
