//! Writer for ninja build files.
//!
//! [`NinjaWriter`] appends rules, build edges and directives to an in-memory
//! buffer and writes it out atomically. Rule names and paths are escaped on
//! the way in; commands and variable values are written verbatim.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NinjaError {
  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Escape a rule name: `+` and spaces become `_`.
pub fn escape_rule_name(name: &str) -> String {
  name.replace(['+', ' '], "_")
}

/// Escape a path for use in a `build` line.
pub fn escape_path(path: &str) -> String {
  path.replace("$ ", "$$ ").replace(' ', "$ ").replace(':', "$:")
}

/// Escape a variable value so `$` is taken literally.
pub fn escape_value(value: &str) -> String {
  value.replace('$', "$$")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
  pub name: String,
  pub command: String,
  pub description: Option<String>,
  pub depfile: Option<String>,
  pub generator: bool,
  pub pool: Option<String>,
  pub restat: bool,
  /// `rspfile` and `rspfile_content`.
  pub rspfile: Option<(String, String)>,
  pub deps: Option<String>,
}

impl Rule {
  pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      command: command.into(),
      ..Default::default()
    }
  }

  pub fn description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn depfile(mut self, depfile: impl Into<String>) -> Self {
    self.depfile = Some(depfile.into());
    self
  }

  pub fn generator(mut self) -> Self {
    self.generator = true;
    self
  }

  pub fn pool(mut self, pool: impl Into<String>) -> Self {
    self.pool = Some(pool.into());
    self
  }

  pub fn restat(mut self) -> Self {
    self.restat = true;
    self
  }

  pub fn rspfile(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
    self.rspfile = Some((path.into(), content.into()));
    self
  }

  pub fn deps(mut self, deps: impl Into<String>) -> Self {
    self.deps = Some(deps.into());
    self
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Build {
  pub outputs: Vec<String>,
  pub implicit_outputs: Vec<String>,
  pub rule: String,
  pub inputs: Vec<String>,
  pub implicit_inputs: Vec<String>,
  pub order_only: Vec<String>,
  /// Written in order as indented `key = value` lines.
  pub variables: Vec<(String, String)>,
  pub pool: Option<String>,
  pub dyndep: Option<String>,
}

impl Build {
  pub fn new(outputs: Vec<String>, rule: impl Into<String>, inputs: Vec<String>) -> Self {
    Self {
      outputs,
      rule: rule.into(),
      inputs,
      ..Default::default()
    }
  }

  pub fn implicit_inputs(mut self, paths: Vec<String>) -> Self {
    self.implicit_inputs = paths;
    self
  }

  pub fn implicit_outputs(mut self, paths: Vec<String>) -> Self {
    self.implicit_outputs = paths;
    self
  }

  pub fn order_only(mut self, paths: Vec<String>) -> Self {
    self.order_only = paths;
    self
  }

  pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.variables.push((key.into(), value.into()));
    self
  }

  pub fn pool(mut self, pool: impl Into<String>) -> Self {
    self.pool = Some(pool.into());
    self
  }

  pub fn dyndep(mut self, dyndep: impl Into<String>) -> Self {
    self.dyndep = Some(dyndep.into());
    self
  }
}

/// Column at which long lines are continued with `$`.
pub const DEFAULT_WIDTH: usize = 80;

#[derive(Debug)]
pub struct NinjaWriter {
  buffer: String,
  width: usize,
}

impl NinjaWriter {
  pub fn new() -> Self {
    Self::with_width(DEFAULT_WIDTH)
  }

  pub fn with_width(width: usize) -> Self {
    Self {
      buffer: String::new(),
      width,
    }
  }

  pub fn as_str(&self) -> &str {
    &self.buffer
  }

  pub fn into_string(self) -> String {
    self.buffer
  }

  pub fn newline(&mut self) {
    self.buffer.push('\n');
  }

  pub fn comment(&mut self, text: &str) {
    for line in text.lines() {
      let _ = writeln!(self.buffer, "# {}", line);
    }
  }

  /// Write one logical line, continuing it with `$` at unescaped spaces
  /// once it runs past the configured width. Continuation lines are
  /// indented two levels deeper than `indent`.
  fn line(&mut self, text: &str, indent: usize) {
    let mut leading = "  ".repeat(indent);
    let mut text = text;

    while leading.len() + text.len() > self.width {
      let available = self.width.saturating_sub(leading.len() + 2);
      let Some(space) = wrap_point(text, available) else {
        break;
      };
      let _ = writeln!(self.buffer, "{}{} $", leading, &text[..space]);
      text = &text[space + 1..];
      leading = "  ".repeat(indent + 2);
    }

    let _ = writeln!(self.buffer, "{}{}", leading, text);
  }

  /// Top-level `key = value` binding.
  pub fn variable(&mut self, key: &str, value: &str) {
    self.line(&format!("{} = {}", key, value), 0);
  }

  fn indented(&mut self, key: &str, value: &str) {
    self.line(&format!("{} = {}", key, value), 1);
  }

  pub fn rule(&mut self, rule: &Rule) {
    self.line(&format!("rule {}", escape_rule_name(&rule.name)), 0);
    self.indented("command", &rule.command);
    if let Some(description) = &rule.description {
      self.indented("description", description);
    }
    if let Some(depfile) = &rule.depfile {
      self.indented("depfile", depfile);
    }
    if rule.generator {
      self.indented("generator", "1");
    }
    if let Some(pool) = &rule.pool {
      self.indented("pool", pool);
    }
    if rule.restat {
      self.indented("restat", "1");
    }
    if let Some((path, content)) = &rule.rspfile {
      self.indented("rspfile", path);
      self.indented("rspfile_content", content);
    }
    if let Some(deps) = &rule.deps {
      self.indented("deps", deps);
    }
    self.newline();
  }

  pub fn build(&mut self, build: &Build) {
    let mut line = String::from("build");
    push_paths(&mut line, "", &build.outputs);
    push_paths(&mut line, " |", &build.implicit_outputs);
    let _ = write!(line, ": {}", escape_rule_name(&build.rule));
    push_paths(&mut line, "", &build.inputs);
    push_paths(&mut line, " |", &build.implicit_inputs);
    push_paths(&mut line, " ||", &build.order_only);

    self.line(&line, 0);
    for (key, value) in &build.variables {
      self.indented(key, value);
    }
    if let Some(pool) = &build.pool {
      self.indented("pool", pool);
    }
    if let Some(dyndep) = &build.dyndep {
      self.indented("dyndep", dyndep);
    }
  }

  /// `build <output>: phony <inputs...>`
  pub fn phony(&mut self, output: &str, inputs: &[String]) {
    self.build(&Build::new(vec![output.to_string()], "phony", inputs.to_vec()));
  }

  pub fn pool(&mut self, name: &str, depth: usize) {
    self.line(&format!("pool {}", name), 0);
    self.indented("depth", &depth.to_string());
    self.newline();
  }

  pub fn include(&mut self, path: &str) {
    self.line(&format!("include {}", escape_path(path)), 0);
  }

  pub fn subninja(&mut self, path: &str) {
    self.line(&format!("subninja {}", escape_path(path)), 0);
  }

  pub fn default(&mut self, paths: &[String]) {
    let mut line = String::from("default");
    push_paths(&mut line, "", paths);
    self.line(&line, 0);
  }

  /// Write the buffer to `path`, replacing any existing file atomically.
  pub fn write(&self, path: &Path) -> Result<(), NinjaError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
      fs::create_dir_all(parent).map_err(|source| NinjaError::CreateDir {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, &self.buffer).map_err(|source| NinjaError::Write {
      path: temp_path.clone(),
      source,
    })?;
    fs::rename(&temp_path, path).map_err(|source| NinjaError::Write {
      path: path.to_path_buf(),
      source,
    })?;

    debug!(path = %path.display(), bytes = self.buffer.len(), "wrote build file");
    Ok(())
  }
}

/// Number of `$` characters immediately before byte `index`.
fn dollars_before(text: &str, index: usize) -> usize {
  text.as_bytes()[..index].iter().rev().take_while(|&&b| b == b'$').count()
}

/// Byte index of the space to break `text` at: the rightmost unescaped
/// space within `available` bytes, otherwise the first unescaped one after.
fn wrap_point(text: &str, available: usize) -> Option<usize> {
  let bytes = text.as_bytes();
  let unescaped = |index: &usize| bytes[*index] == b' ' && dollars_before(text, *index) % 2 == 0;

  (0..available.min(bytes.len()))
    .rev()
    .find(unescaped)
    .or_else(|| (available..bytes.len()).find(unescaped))
}

fn push_paths(line: &mut String, separator: &str, paths: &[String]) {
  if paths.is_empty() {
    return;
  }
  line.push_str(separator);
  for path in paths {
    line.push(' ');
    line.push_str(&escape_path(path));
  }
}
