use std::fmt;

use serde::Serialize;

/// CPU architectures a build can run on or target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Arch {
  X86_64,
  Arm64,
}

impl Arch {
  /// Detect the current CPU architecture at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::ARCH {
      "x86_64" => Some(Self::X86_64),
      "aarch64" => Some(Self::Arm64),
      _ => None,
    }
  }

  /// Returns the identifier bound to the `*_cpu` variables
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86_64 => "x86_64",
      Self::Arm64 => "arm64",
    }
  }

  /// Architecture component of a compiler target triple.
  pub fn triple_component(&self) -> &'static str {
    match self {
      Self::X86_64 => "x86_64",
      Self::Arm64 => "aarch64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
