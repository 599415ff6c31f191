//! Host platform detection.
//!
//! The evaluator seeds every root scope with the platform the build runs on,
//! so scripts can branch on `host_os` and `host_cpu`.

pub mod arch;
pub mod os;

use std::fmt;

pub use arch::Arch;
pub use os::Os;

/// Architecture and OS pair (e.g., "arm64-macos")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      arch: Arch::current()?,
      os: Os::current()?,
    })
  }

  /// The compiler target triple for this platform.
  pub fn triple(&self) -> String {
    let arch = self.arch.triple_component();
    match self.os {
      Os::Linux => format!("{}-unknown-linux-gnu", arch),
      Os::Windows => format!("{}-unknown-windows-msvc", arch),
      Os::MacOs => format!("{}-apple-macosx13.0", self.arch.as_str()),
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.arch, self.os)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn triple_format() {
    let platform = Platform::new(Arch::Arm64, Os::MacOs);
    assert_eq!(platform.triple(), "arm64-apple-macosx13.0");

    let platform = Platform::new(Arch::X86_64, Os::Linux);
    assert_eq!(platform.triple(), "x86_64-unknown-linux-gnu");

    let platform = Platform::new(Arch::Arm64, Os::Windows);
    assert_eq!(platform.triple(), "aarch64-unknown-windows-msvc");
  }

  #[test]
  fn display_is_arch_then_os() {
    assert_eq!(Platform::new(Arch::X86_64, Os::Windows).to_string(), "x86_64-windows");
  }
}
