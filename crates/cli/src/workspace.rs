//! Workspace root discovery.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

/// File marking the root of a workspace.
pub const WORKSPACE_MARKER: &str = "WORKSPACE";

/// Walk from `start` upwards to the first directory holding a `WORKSPACE`
/// file.
pub fn find_root(start: &Path) -> Result<PathBuf> {
  for directory in start.ancestors() {
    if directory.join(WORKSPACE_MARKER).is_file() {
      debug!(root = %directory.display(), "found workspace root");
      return Ok(directory.to_path_buf());
    }
  }
  bail!(
    "no {} file found in {} or any parent directory",
    WORKSPACE_MARKER,
    start.display()
  )
}

/// The explicit `--root` when given, otherwise discovery from the current
/// directory. The result is canonical.
pub fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
  let root = match explicit {
    Some(root) => root,
    None => {
      let current = env::current_dir().context("Failed to read current directory")?;
      find_root(&current)?
    }
  };
  dunce::canonicalize(&root)
    .with_context(|| format!("Failed to resolve workspace root: {}", root.display()))
}

/// `path` made absolute against the current directory.
pub fn absolute(path: &Path) -> Result<PathBuf> {
  if path.is_absolute() {
    return Ok(path.to_path_buf());
  }
  let current = env::current_dir().context("Failed to read current directory")?;
  Ok(current.join(path))
}
