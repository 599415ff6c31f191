//! Parser diagnostics.

use std::fmt;

use super::source::{Location, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
  Note,
  Warning,
  Error,
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Level::Note => "note",
      Level::Warning => "warning",
      Level::Error => "error",
    })
  }
}

/// A single message tied to a range of the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
  pub level: Level,
  pub message: String,
  pub span: Span,
  /// Where `span` starts, resolved against the file being parsed.
  pub location: Location,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}: {}", self.location, self.level, self.message)
  }
}

/// The accumulated diagnostics of one parse pass.
///
/// A non-empty set is the error value of [`super::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticSet {
  diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, diagnostic: Diagnostic) {
    if !self.diagnostics.contains(&diagnostic) {
      self.diagnostics.push(diagnostic);
    }
  }

  pub fn is_empty(&self) -> bool {
    self.diagnostics.is_empty()
  }

  pub fn len(&self) -> usize {
    self.diagnostics.len()
  }

  pub fn has_errors(&self) -> bool {
    self.diagnostics.iter().any(|d| d.level == Level::Error)
  }

  /// Diagnostics ordered by position.
  pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
    let mut sorted: Vec<_> = self.diagnostics.iter().collect();
    sorted.sort_by_key(|d| (d.span.start, d.level));
    sorted.into_iter()
  }
}

impl fmt::Display for DiagnosticSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (index, diagnostic) in self.iter().enumerate() {
      if index > 0 {
        writeln!(f)?;
      }
      write!(f, "{}", diagnostic)?;
    }
    Ok(())
  }
}

impl std::error::Error for DiagnosticSet {}
