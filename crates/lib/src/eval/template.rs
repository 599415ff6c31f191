//! User-defined rule templates.
//!
//! A template is declared with `template("name") { body }` and invoked like a
//! builtin: `name("target") { attributes }`. The invocation block runs first in
//! its own scope; the body then runs in a child of that scope where
//! `target_name`, `arguments` and `invoker` are bound.

use crate::parser::{Expression, FunctionCall};

use super::scope::Scope;
use super::value::Value;
use super::variables::Variable;
use super::{ExecutionError, evaluate};

#[derive(Debug, Clone)]
pub struct Template {
  pub name: String,
  /// Always a block expression.
  pub body: Expression,
}

pub(crate) fn invoke(
  template: &Template,
  call: &FunctionCall,
  arguments: Vec<Value>,
  scope: &mut Scope<'_>,
) -> Result<Value, ExecutionError> {
  let target_name = match arguments.first() {
    Some(Value::String(name)) => Some(name.clone()),
    Some(other) => {
      return Err(ExecutionError::new(
        format!(
          "the first argument to template '{}' must be of type string, found {}",
          template.name,
          other.type_name()
        ),
        Some(call.span),
      ));
    }
    None => None,
  };

  let mut invoker = scope.child(scope.directory().to_path_buf());
  if let Some(block) = &call.block {
    evaluate(block, &mut invoker)?;
  }

  let mut body = invoker.child(invoker.directory().to_path_buf());
  if let Some(name) = target_name {
    body.set(Variable::TargetName.name(), Value::String(name));
  }
  body.set("arguments", Value::List(arguments));
  body.set("invoker", Value::Scope(invoker.snapshot()));
  evaluate(&template.body, &mut body)?;

  Ok(Value::Nil)
}
