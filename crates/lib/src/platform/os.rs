use std::fmt;

use serde::Serialize;

/// Operating systems a build can run on or target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the identifier bound to the `*_os` variables
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "macos",
      Self::Windows => "windows",
    }
  }

  /// Default extension for a static archive on this OS.
  pub fn static_library_extension(&self) -> &'static str {
    match self {
      Self::Windows => "lib",
      Self::Linux | Self::MacOs => "a",
    }
  }

  /// Default extension for a shared library on this OS.
  pub fn dynamic_library_extension(&self) -> &'static str {
    match self {
      Self::Windows => "dll",
      Self::Linux | Self::MacOs => "so",
    }
  }

  /// Default extension for an executable on this OS.
  pub fn executable_extension(&self) -> &'static str {
    match self {
      Self::Windows => "exe",
      Self::Linux | Self::MacOs => "",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for Os {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "linux" => Ok(Self::Linux),
      "macos" => Ok(Self::MacOs),
      "windows" => Ok(Self::Windows),
      other => Err(format!("unknown operating system '{}'", other)),
    }
  }
}
