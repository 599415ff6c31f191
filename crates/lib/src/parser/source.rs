//! Source buffers and positions.
//!
//! Tokens and AST nodes carry byte [`Span`]s into a [`SourceFile`]. Spans are
//! only turned into human readable [`Location`]s when a diagnostic or an
//! execution error has to be reported.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// A half-open byte range into a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Span {
  pub start: usize,
  pub end: usize,
}

impl Span {
  pub fn new(start: usize, end: usize) -> Self {
    Self { start, end }
  }

  /// An empty span positioned at `offset`.
  pub fn empty(offset: usize) -> Self {
    Self::new(offset, offset)
  }

  /// Extend this span so that it ends at `end`.
  pub fn extended(self, end: usize) -> Self {
    Self::new(self.start, end.max(self.end))
  }

  /// The smallest span covering both `self` and `other`.
  pub fn to(self, other: Span) -> Self {
    Self::new(self.start.min(other.start), self.end.max(other.end))
  }

  pub fn len(&self) -> usize {
    self.end - self.start
  }

  pub fn is_empty(&self) -> bool {
    self.start == self.end
  }
}

/// A resolved, printable position inside a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Location {
  pub path: PathBuf,
  pub line: usize,
  pub column: usize,
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
  }
}

/// A description file loaded into memory.
#[derive(Debug, Clone)]
pub struct SourceFile {
  path: PathBuf,
  text: String,
  /// Byte offset of the first character of every line.
  lines: Vec<usize>,
}

impl SourceFile {
  /// Read a file from disk.
  pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    Ok(Self::new(path.to_path_buf(), text))
  }

  /// Wrap an in-memory buffer. `name` is used in rendered locations.
  pub fn from_buffer(text: impl Into<String>, name: impl Into<PathBuf>) -> Self {
    Self::new(name.into(), text.into())
  }

  fn new(path: PathBuf, text: String) -> Self {
    let mut lines = vec![0];
    lines.extend(text.match_indices('\n').map(|(index, _)| index + 1));
    Self { path, text, lines }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  /// The source text covered by `span`.
  pub fn slice(&self, span: Span) -> &str {
    &self.text[span.start.min(self.text.len())..span.end.min(self.text.len())]
  }

  /// Map a byte offset to a 1-based line and column.
  pub fn position(&self, offset: usize) -> (usize, usize) {
    let line = self.lines.partition_point(|&start| start <= offset);
    let start = self.lines[line.saturating_sub(1)];
    let column = self.text[start..offset.min(self.text.len())].chars().count() + 1;
    (line.max(1), column)
  }

  pub fn location(&self, offset: usize) -> Location {
    let (line, column) = self.position(offset);
    Location {
      path: self.path.clone(),
      line,
      column,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn positions_are_one_based() {
    let source = SourceFile::from_buffer("a = 1\nbb = 2\n", "BUILD.gn");
    assert_eq!(source.position(0), (1, 1));
    assert_eq!(source.position(4), (1, 5));
    assert_eq!(source.position(6), (2, 1));
    assert_eq!(source.position(8), (2, 3));
  }

  #[test]
  fn location_display_includes_path() {
    let source = SourceFile::from_buffer("x\ny", "dir/BUILD.gn");
    assert_eq!(source.location(2).to_string(), "dir/BUILD.gn:2:1");
  }

  #[test]
  fn span_helpers() {
    let span = Span::new(2, 4).extended(9);
    assert_eq!(span, Span::new(2, 9));
    assert_eq!(Span::new(5, 6).to(Span::new(1, 2)), Span::new(1, 6));
    assert!(Span::empty(3).is_empty());
  }
}
