//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// An application with one library dependency and a group over both.
pub const APP_WORKSPACE: &[(&str, &str)] = &[
  ("WORKSPACE", ""),
  (
    "BUILD.gn",
    r#"
group("all") {
  deps = ["//app:app"]
}
"#,
  ),
  (
    "app/BUILD.gn",
    r#"
executable("app") {
  sources = ["main.swift"]
  deps = ["//lib:core"]
}
"#,
  ),
  (
    "lib/BUILD.gn",
    r#"
static_library("core") {
  sources = ["core.swift"]
  module_name = "Core"
}
"#,
  ),
];

/// Isolated workspace on disk.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create an empty workspace (with its `WORKSPACE` marker).
  pub fn empty() -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("WORKSPACE", "");
    env
  }

  /// Create a workspace from `(path, content)` pairs.
  pub fn with_files(files: &[(&str, &str)]) -> Self {
    let env = Self::empty();
    for (path, content) in files {
      env.write_file(path, content);
    }
    env
  }

  /// Write a file relative to the workspace root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Canonical workspace root.
  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.root().join(relative_path)
  }

  pub fn read(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.path(relative_path)).unwrap()
  }

  /// Read a generated build file with `$` line continuations folded back.
  pub fn read_build_file(&self, relative_path: &str) -> String {
    let text = self.read(relative_path);
    let mut out = String::new();
    let mut rest = text.as_str();
    while let Some(index) = rest.find(" $\n") {
      out.push_str(&rest[..index + 1]);
      rest = rest[index + 3..].trim_start_matches(' ');
    }
    out.push_str(rest);
    out
  }

  /// An sb command running inside `dir` (relative to the root).
  pub fn sb_cmd_in(&self, dir: &str) -> Command {
    let mut cmd = cargo_bin_cmd!("sb");
    cmd.current_dir(self.path(dir)).env_remove("RUST_LOG");
    cmd
  }

  /// An sb command running at the workspace root.
  pub fn sb_cmd(&self) -> Command {
    self.sb_cmd_in("")
  }

  pub fn exists(&self, relative_path: &str) -> bool {
    Path::new(&self.path(relative_path)).exists()
  }
}
