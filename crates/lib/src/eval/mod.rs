//! Evaluation of description files.
//!
//! [`evaluate`] walks one expression against a [`Scope`]; [`evaluate_file`]
//! parses and runs a whole file and returns the targets it declared.
//!
//! ```
//! use antimony_lib::eval::{Scope, evaluate_file};
//! use antimony_lib::parser::SourceFile;
//!
//! let source = SourceFile::from_buffer(r#"group("all") { deps = [":app"] }"#, "/w/BUILD.gn");
//! let mut scope = Scope::new("/w", "/w");
//! let targets = evaluate_file(&source, &mut scope).unwrap();
//! assert_eq!(targets[0].label.name, "all");
//! ```

pub mod builtins;
pub mod reify;
pub mod scope;
pub mod template;
pub mod value;
pub mod variables;

use thiserror::Error;
use tracing::trace;

use crate::parser::{
  DiagnosticSet, Expression, FunctionCall, Location, Operator, SourceFile, Span, parse,
};
use crate::target::Target;

pub use scope::{Scope, TargetCollector};
pub use template::Template;
pub use value::{ScopeRef, Value};
pub use variables::{ANTIMONY_VERSION, Variable, default_variables};

/// Deepest scope nesting a template expansion may reach.
pub const MAX_SCOPE_DEPTH: usize = 128;

/// A failure while executing a description file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", located_at(.location))]
pub struct ExecutionError {
  pub message: String,
  pub span: Option<Span>,
  /// Filled in once the error leaves the file it was raised in.
  pub location: Option<Location>,
}

impl ExecutionError {
  pub fn new(message: impl Into<String>, span: Option<Span>) -> Self {
    Self {
      message: message.into(),
      span,
      location: None,
    }
  }

  /// Resolve the span against `source`.
  pub fn located(mut self, source: &SourceFile) -> Self {
    if self.location.is_none() {
      self.location = self.span.map(|span| source.location(span.start));
    }
    self
  }
}

fn located_at(location: &Option<Location>) -> String {
  match location {
    Some(location) => location.to_string(),
    None => "<unknown>".to_string(),
  }
}

/// Errors from [`evaluate_file`].
#[derive(Debug, Error)]
pub enum EvaluateError {
  #[error("{0}")]
  Parse(#[from] DiagnosticSet),

  #[error(transparent)]
  Execution(#[from] ExecutionError),
}

/// Parse `source` and evaluate it in `scope`, returning the declared targets
/// in declaration order.
pub fn evaluate_file(
  source: &SourceFile,
  scope: &mut Scope<'_>,
) -> Result<Vec<Target>, EvaluateError> {
  let statements = parse(source)?;
  for statement in &statements {
    evaluate(statement, scope).map_err(|err| err.located(source))?;
  }
  Ok(scope.collector().take())
}

/// Evaluate a single expression, mutating `scope` for assignments and rule
/// invocations.
pub fn evaluate(expression: &Expression, scope: &mut Scope<'_>) -> Result<Value, ExecutionError> {
  match expression {
    Expression::Array { elements, .. } => {
      let values = elements
        .iter()
        .map(|element| evaluate(element, scope))
        .collect::<Result<Vec<_>, _>>()?;
      Ok(Value::List(values))
    }
    Expression::BinaryOperand {
      operator,
      lhs,
      rhs,
      operator_span,
    } if operator.is_assignment() => assign(*operator, lhs, rhs, *operator_span, scope),
    Expression::BinaryOperand { .. } => chain(expression, scope),
    Expression::Block { statements, .. } => {
      for statement in statements {
        evaluate(statement, scope)?;
      }
      Ok(Value::Nil)
    }
    Expression::Conditional {
      condition,
      positive,
      negative,
    } => {
      let value = evaluate(condition, scope)?;
      let Some(taken) = value.as_bool() else {
        return Err(ExecutionError::new(
          format!("condition must be of type boolean, found {}", value.type_name()),
          Some(condition.span()),
        ));
      };
      if taken {
        evaluate(positive, scope)?;
      } else if let Some(negative) = negative {
        evaluate(negative, scope)?;
      }
      Ok(Value::Nil)
    }
    Expression::DeclarationReference(identifier) => {
      scope.get(&identifier.name).cloned().ok_or_else(|| {
        ExecutionError::new(
          format!("undefined variable '{}'", identifier.name),
          Some(identifier.span),
        )
      })
    }
    Expression::FunctionCall(call) => call_function(call, scope),
    Expression::BooleanLiteral { value, .. } => Ok(Value::Boolean(*value)),
    Expression::IntegerLiteral { value, .. } => Ok(Value::Integer(*value)),
    Expression::StringLiteral { value, .. } => Ok(Value::String(value.clone())),
  }
}

fn call_function(call: &FunctionCall, scope: &mut Scope<'_>) -> Result<Value, ExecutionError> {
  let name = &call.callee.name;
  let template = scope.template(name);
  let builtin = match template {
    Some(_) => None,
    None => Some(
      builtins::lookup(name).ok_or_else(|| {
        ExecutionError::new(format!("unknown function '{}'", name), Some(call.callee.span))
      })?,
    ),
  };

  let arguments = call
    .arguments
    .iter()
    .map(|argument| evaluate(argument, scope))
    .collect::<Result<Vec<_>, _>>()?;

  match (template, builtin) {
    (Some(template), _) => {
      if scope.depth() >= MAX_SCOPE_DEPTH {
        return Err(ExecutionError::new(
          format!("template '{}' is nested too deeply", name),
          Some(call.callee.span),
        ));
      }
      trace!(template = %name, "invoking template");
      template::invoke(&template, call, arguments, scope)
    }
    (None, Some(builtin)) => builtin(call, arguments, scope),
    (None, None) => Ok(Value::Nil),
  }
}

/// Evaluate a run of left-associative operators such as `a + b - c`.
///
/// The parser nests these one node per operator along the left-hand side, so
/// the spine is walked with a loop and folded from the innermost operand out.
fn chain(expression: &Expression, scope: &mut Scope<'_>) -> Result<Value, ExecutionError> {
  let mut spine = Vec::new();
  let mut base = expression;
  while let Expression::BinaryOperand {
    operator,
    lhs,
    rhs,
    operator_span,
  } = base
  {
    if operator.is_assignment() {
      break;
    }
    spine.push((*operator, lhs.as_ref(), rhs.as_ref(), *operator_span));
    base = lhs.as_ref();
  }

  let mut value = evaluate(base, scope)?;
  for (operator, lhs, rhs, span) in spine.into_iter().rev() {
    value = combine(operator, value, lhs, rhs, span, scope)?;
  }
  Ok(value)
}

/// Apply `operator` to an already evaluated left operand.
fn combine(
  operator: Operator,
  left: Value,
  lhs: &Expression,
  rhs: &Expression,
  span: Span,
  scope: &mut Scope<'_>,
) -> Result<Value, ExecutionError> {
  match operator {
    Operator::Assign | Operator::AddAssign | Operator::SubtractAssign => Err(ExecutionError::new(
      format!("'{}' cannot be used inside an expression", operator.as_str()),
      Some(span),
    )),
    Operator::And | Operator::Or => {
      let short_circuit = operator == Operator::Or;
      if boolean_value(operator, left, lhs)? == short_circuit {
        return Ok(Value::Boolean(short_circuit));
      }
      let right = evaluate(rhs, scope)?;
      Ok(Value::Boolean(boolean_value(operator, right, rhs)?))
    }
    Operator::Equal => Ok(Value::Boolean(left == evaluate(rhs, scope)?)),
    Operator::NotEqual => Ok(Value::Boolean(left != evaluate(rhs, scope)?)),
    Operator::Less | Operator::LessEqual | Operator::Greater | Operator::GreaterEqual => {
      let right = evaluate(rhs, scope)?;
      let (Some(a), Some(b)) = (left.as_integer(), right.as_integer()) else {
        return Err(ExecutionError::new(
          format!(
            "'{}' requires integer operands, found {} and {}",
            operator.as_str(),
            left.type_name(),
            right.type_name()
          ),
          Some(span),
        ));
      };
      Ok(Value::Boolean(match operator {
        Operator::Less => a < b,
        Operator::LessEqual => a <= b,
        Operator::Greater => a > b,
        _ => a >= b,
      }))
    }
    Operator::Add => add(left, evaluate(rhs, scope)?, span),
    Operator::Subtract => subtract(left, evaluate(rhs, scope)?, span),
  }
}

fn boolean_value(
  operator: Operator,
  value: Value,
  operand: &Expression,
) -> Result<bool, ExecutionError> {
  value.as_bool().ok_or_else(|| {
    ExecutionError::new(
      format!(
        "'{}' requires boolean operands, found {}",
        operator.as_str(),
        value.type_name()
      ),
      Some(operand.span()),
    )
  })
}

fn assign(
  operator: Operator,
  lhs: &Expression,
  rhs: &Expression,
  span: Span,
  scope: &mut Scope<'_>,
) -> Result<Value, ExecutionError> {
  let Expression::DeclarationReference(identifier) = lhs else {
    return Err(ExecutionError::new(
      "the left-hand side of an assignment must be an identifier",
      Some(lhs.span()),
    ));
  };

  let value = evaluate(rhs, scope)?;
  let value = match operator {
    Operator::Assign => value,
    _ => {
      let current = scope.get(&identifier.name).cloned().ok_or_else(|| {
        ExecutionError::new(
          format!("undefined variable '{}'", identifier.name),
          Some(identifier.span),
        )
      })?;
      if operator == Operator::AddAssign {
        add(current, value, span)?
      } else {
        subtract(current, value, span)?
      }
    }
  };

  scope.set(identifier.name.clone(), value);
  Ok(Value::Nil)
}

fn add(lhs: Value, rhs: Value, span: Span) -> Result<Value, ExecutionError> {
  match (lhs, rhs) {
    (Value::Integer(a), Value::Integer(b)) => a
      .checked_add(b)
      .map(Value::Integer)
      .ok_or_else(|| ExecutionError::new("integer overflow in '+'", Some(span))),
    (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
    (Value::List(mut a), Value::List(b)) => {
      a.extend(b);
      Ok(Value::List(a))
    }
    (Value::List(mut a), other) => {
      a.push(other);
      Ok(Value::List(a))
    }
    (a, b) => Err(ExecutionError::new(
      format!("cannot add {} to {}", b.type_name(), a.type_name()),
      Some(span),
    )),
  }
}

fn subtract(lhs: Value, rhs: Value, span: Span) -> Result<Value, ExecutionError> {
  match (lhs, rhs) {
    (Value::Integer(a), Value::Integer(b)) => a
      .checked_sub(b)
      .map(Value::Integer)
      .ok_or_else(|| ExecutionError::new("integer overflow in '-'", Some(span))),
    (Value::List(mut a), Value::List(b)) => {
      a.retain(|value| !b.contains(value));
      Ok(Value::List(a))
    }
    (Value::List(mut a), other) => {
      a.retain(|value| *value != other);
      Ok(Value::List(a))
    }
    (a, b) => Err(ExecutionError::new(
      format!("cannot subtract {} from {}", b.type_name(), a.type_name()),
      Some(span),
    )),
  }
}
