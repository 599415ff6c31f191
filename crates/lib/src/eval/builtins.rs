//! Native functions callable from description files.
//!
//! Every builtin validates its own arguments. Checks run in a fixed order:
//! import/config gating, argument count, argument types, then the presence
//! of an attached block.

use tracing::trace;

use crate::parser::{Expression, FunctionCall};
use crate::target::TargetKind;

use super::scope::Scope;
use super::template::Template;
use super::value::Value;
use super::variables::Variable;
use super::{ExecutionError, evaluate, reify};

pub(crate) type Builtin =
  fn(&FunctionCall, Vec<Value>, &mut Scope<'_>) -> Result<Value, ExecutionError>;

pub(crate) fn lookup(name: &str) -> Option<Builtin> {
  Some(match name {
    "assert" => assert as Builtin,
    "config" => config,
    "executable" => executable,
    "group" => group,
    "shared_library" => shared_library,
    "static_library" => static_library,
    "template" => template,
    _ => return None,
  })
}

fn error(call: &FunctionCall, message: impl Into<String>) -> ExecutionError {
  ExecutionError::new(message, Some(call.callee.span.to(call.span)))
}

fn plural(count: usize) -> &'static str {
  if count == 1 { "argument" } else { "arguments" }
}

fn expect_arguments(
  call: &FunctionCall,
  arguments: &[Value],
  expected: usize,
) -> Result<(), ExecutionError> {
  if arguments.len() == expected {
    return Ok(());
  }
  Err(error(
    call,
    format!(
      "'{}' takes {} {}, {} provided",
      call.callee.name,
      expected,
      plural(expected),
      arguments.len()
    ),
  ))
}

fn string_argument(
  call: &FunctionCall,
  arguments: &[Value],
  index: usize,
) -> Result<String, ExecutionError> {
  match &arguments[index] {
    Value::String(value) => Ok(value.clone()),
    other => Err(error(
      call,
      format!(
        "argument {} to '{}' must be of type string, found {}",
        index + 1,
        call.callee.name,
        other.type_name()
      ),
    )),
  }
}

fn require_block<'c>(call: &'c FunctionCall) -> Result<&'c Expression, ExecutionError> {
  call
    .block
    .as_deref()
    .ok_or_else(|| error(call, "This function call requires a block."))
}

fn ensure_declarable(call: &FunctionCall, scope: &Scope<'_>) -> Result<(), ExecutionError> {
  if scope.importing {
    return Err(error(
      call,
      format!("'{}' cannot declare a target while importing", call.callee.name),
    ));
  }
  if scope.configuring {
    return Err(error(
      call,
      format!("'{}' cannot declare a target while configuring", call.callee.name),
    ));
  }
  Ok(())
}

/// Shared body of the target-declaring builtins.
///
/// The block is evaluated exactly once, in a child scope with `target_name`
/// bound, and the resulting bindings are reified into a target.
fn declare(
  call: &FunctionCall,
  arguments: Vec<Value>,
  scope: &mut Scope<'_>,
  configuring: bool,
  reify: impl FnOnce(&Scope<'_>) -> Result<crate::target::Target, ExecutionError>,
) -> Result<Value, ExecutionError> {
  expect_arguments(call, &arguments, 1)?;
  let name = string_argument(call, &arguments, 0)?;
  let block = require_block(call)?;

  let target = {
    let mut child = scope.child(scope.directory().to_path_buf());
    child.configuring = child.configuring || configuring;
    child.set(Variable::TargetName.name(), Value::String(name));
    evaluate(block, &mut child)?;
    reify(&child)?
  };
  scope.collector().append(target);
  Ok(Value::Nil)
}

fn module(
  kind: TargetKind,
  call: &FunctionCall,
  arguments: Vec<Value>,
  scope: &mut Scope<'_>,
) -> Result<Value, ExecutionError> {
  ensure_declarable(call, scope)?;
  let span = call.span;
  declare(call, arguments, scope, false, |child| reify::module(kind, child, span))
}

fn executable(
  call: &FunctionCall,
  arguments: Vec<Value>,
  scope: &mut Scope<'_>,
) -> Result<Value, ExecutionError> {
  module(TargetKind::Executable, call, arguments, scope)
}

fn static_library(
  call: &FunctionCall,
  arguments: Vec<Value>,
  scope: &mut Scope<'_>,
) -> Result<Value, ExecutionError> {
  module(TargetKind::StaticLibrary, call, arguments, scope)
}

fn shared_library(
  call: &FunctionCall,
  arguments: Vec<Value>,
  scope: &mut Scope<'_>,
) -> Result<Value, ExecutionError> {
  module(TargetKind::DynamicLibrary, call, arguments, scope)
}

fn group(
  call: &FunctionCall,
  arguments: Vec<Value>,
  scope: &mut Scope<'_>,
) -> Result<Value, ExecutionError> {
  ensure_declarable(call, scope)?;
  let span = call.span;
  declare(call, arguments, scope, false, |child| reify::group(child, span))
}

fn config(
  call: &FunctionCall,
  arguments: Vec<Value>,
  scope: &mut Scope<'_>,
) -> Result<Value, ExecutionError> {
  ensure_declarable(call, scope)?;
  let span = call.span;
  declare(call, arguments, scope, true, |child| reify::config(child, span))
}

fn template(
  call: &FunctionCall,
  arguments: Vec<Value>,
  scope: &mut Scope<'_>,
) -> Result<Value, ExecutionError> {
  if scope.configuring {
    return Err(error(call, "'template' cannot be used while configuring"));
  }
  expect_arguments(call, &arguments, 1)?;
  let name = string_argument(call, &arguments, 0)?;
  let body = require_block(call)?.clone();

  if lookup(&name).is_some() {
    return Err(error(call, format!("cannot redefine builtin '{}'", name)));
  }

  trace!(template = %name, "defined template");
  scope.define_template(Template { name, body });
  Ok(Value::Nil)
}

fn assert(
  call: &FunctionCall,
  arguments: Vec<Value>,
  _scope: &mut Scope<'_>,
) -> Result<Value, ExecutionError> {
  if arguments.is_empty() || arguments.len() > 2 {
    return Err(error(
      call,
      format!("'assert' takes 1 or 2 arguments, {} provided", arguments.len()),
    ));
  }

  let condition = arguments[0].as_bool().ok_or_else(|| {
    error(
      call,
      format!(
        "argument 1 to 'assert' must be of type boolean, found {}",
        arguments[0].type_name()
      ),
    )
  })?;
  let message = match arguments.get(1) {
    Some(_) => Some(string_argument(call, &arguments, 1)?),
    None => None,
  };

  if call.block.is_some() {
    return Err(error(call, "'assert' does not take a block"));
  }

  if condition {
    return Ok(Value::Nil);
  }
  Err(error(
    call,
    match message {
      Some(message) => format!("assertion failure: {}", message),
      None => "assertion failure".to_string(),
    },
  ))
}
