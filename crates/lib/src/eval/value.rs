//! Runtime values manipulated by the evaluator.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A frozen snapshot of a scope's own bindings.
///
/// Two references are equal only when they point at the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct ScopeRef(Rc<HashMap<String, Value>>);

impl ScopeRef {
  pub fn new(bindings: HashMap<String, Value>) -> Self {
    Self(Rc::new(bindings))
  }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self.0.get(name)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl PartialEq for ScopeRef {
  fn eq(&self, other: &Self) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
  #[default]
  Nil,
  Boolean(bool),
  Integer(i64),
  String(String),
  List(Vec<Value>),
  Scope(ScopeRef),
}

impl Value {
  /// The type name used in error messages.
  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Nil => "nil",
      Value::Boolean(_) => "boolean",
      Value::Integer(_) => "integer",
      Value::String(_) => "string",
      Value::List(_) => "list",
      Value::Scope(_) => "scope",
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Boolean(value) => Some(*value),
      _ => None,
    }
  }

  pub fn as_integer(&self) -> Option<i64> {
    match self {
      Value::Integer(value) => Some(*value),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(value) => Some(value),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[Value]> {
    match self {
      Value::List(values) => Some(values),
      _ => None,
    }
  }

  /// A list whose every element is a string.
  pub fn as_string_list(&self) -> Option<Vec<String>> {
    self
      .as_list()?
      .iter()
      .map(|value| value.as_str().map(str::to_string))
      .collect()
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Nil => f.write_str("nil"),
      Value::Boolean(value) => write!(f, "{}", value),
      Value::Integer(value) => write!(f, "{}", value),
      Value::String(value) => write!(f, "\"{}\"", value),
      Value::List(values) => {
        f.write_str("[")?;
        for (index, value) in values.iter().enumerate() {
          if index > 0 {
            f.write_str(", ")?;
          }
          write!(f, "{}", value)?;
        }
        f.write_str("]")
      }
      Value::Scope(scope) => write!(f, "<scope with {} bindings>", scope.len()),
    }
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self {
    Value::Boolean(value)
  }
}

impl From<i64> for Value {
  fn from(value: i64) -> Self {
    Value::Integer(value)
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Value::String(value.to_string())
  }
}

impl From<String> for Value {
  fn from(value: String) -> Self {
    Value::String(value)
  }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
  fn from(values: Vec<T>) -> Self {
    Value::List(values.into_iter().map(Into::into).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scalars_compare_structurally() {
    assert_eq!(Value::from(3i64), Value::Integer(3));
    assert_ne!(Value::from("3"), Value::from(3i64));
    assert_eq!(Value::Nil, Value::default());
  }

  #[test]
  fn lists_compare_elementwise() {
    assert_eq!(Value::from(vec!["a", "b"]), Value::from(vec!["a", "b"]));
    assert_ne!(Value::from(vec!["a", "b"]), Value::from(vec!["a"]));
    assert_ne!(Value::from(vec![1i64, 2]), Value::from(vec![2i64, 1]));
  }

  #[test]
  fn scope_references_compare_by_identity() {
    let first = ScopeRef::new(HashMap::new());
    let second = ScopeRef::new(HashMap::new());
    assert_eq!(Value::Scope(first.clone()), Value::Scope(first));
    assert_ne!(Value::Scope(second), Value::Scope(ScopeRef::default()));
  }

  #[test]
  fn string_list_rejects_mixed_elements() {
    assert_eq!(
      Value::from(vec!["x", "y"]).as_string_list(),
      Some(vec!["x".to_string(), "y".to_string()])
    );
    let mixed = Value::List(vec![Value::from("x"), Value::from(1i64)]);
    assert_eq!(mixed.as_string_list(), None);
  }
}
