//! Syntax tree produced by the parser.

use super::source::Span;
use super::token::TokenKind;

/// Binary and assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
  Assign,
  AddAssign,
  SubtractAssign,
  Or,
  And,
  Equal,
  NotEqual,
  Less,
  LessEqual,
  Greater,
  GreaterEqual,
  Add,
  Subtract,
}

impl Operator {
  pub fn from_token(kind: TokenKind) -> Option<Self> {
    Some(match kind {
      TokenKind::Equal => Self::Assign,
      TokenKind::PlusEqual => Self::AddAssign,
      TokenKind::MinusEqual => Self::SubtractAssign,
      TokenKind::PipePipe => Self::Or,
      TokenKind::AmpersandAmpersand => Self::And,
      TokenKind::EqualEqual => Self::Equal,
      TokenKind::BangEqual => Self::NotEqual,
      TokenKind::Less => Self::Less,
      TokenKind::LessEqual => Self::LessEqual,
      TokenKind::Greater => Self::Greater,
      TokenKind::GreaterEqual => Self::GreaterEqual,
      TokenKind::Plus => Self::Add,
      TokenKind::Minus => Self::Subtract,
      _ => return None,
    })
  }

  pub fn is_assignment(&self) -> bool {
    matches!(self, Self::Assign | Self::AddAssign | Self::SubtractAssign)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Assign => "=",
      Self::AddAssign => "+=",
      Self::SubtractAssign => "-=",
      Self::Or => "||",
      Self::And => "&&",
      Self::Equal => "==",
      Self::NotEqual => "!=",
      Self::Less => "<",
      Self::LessEqual => "<=",
      Self::Greater => ">",
      Self::GreaterEqual => ">=",
      Self::Add => "+",
      Self::Subtract => "-",
    }
  }
}

/// A reference to a named variable or function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
  pub name: String,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
  pub callee: Identifier,
  pub arguments: Vec<Expression>,
  /// The `{ ... }` body attached to the call, if any.
  pub block: Option<Box<Expression>>,
  /// Covers the parenthesised argument list.
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
  Array {
    elements: Vec<Expression>,
    span: Span,
  },
  BinaryOperand {
    operator: Operator,
    lhs: Box<Expression>,
    rhs: Box<Expression>,
    /// The operator token.
    operator_span: Span,
  },
  Block {
    statements: Vec<Expression>,
    span: Span,
  },
  Conditional {
    condition: Box<Expression>,
    positive: Box<Expression>,
    negative: Option<Box<Expression>>,
  },
  DeclarationReference(Identifier),
  FunctionCall(FunctionCall),
  BooleanLiteral {
    value: bool,
    span: Span,
  },
  IntegerLiteral {
    value: i64,
    span: Span,
  },
  StringLiteral {
    value: String,
    span: Span,
  },
}

impl Expression {
  pub fn span(&self) -> Span {
    match self {
      Self::Array { span, .. }
      | Self::Block { span, .. }
      | Self::BooleanLiteral { span, .. }
      | Self::IntegerLiteral { span, .. }
      | Self::StringLiteral { span, .. } => *span,
      Self::BinaryOperand { lhs, rhs, .. } => {
        // Left-nested chains can be arbitrarily long; walk the spine.
        let mut leftmost = lhs.as_ref();
        while let Self::BinaryOperand { lhs, .. } = leftmost {
          leftmost = lhs.as_ref();
        }
        leftmost.span().to(rhs.span())
      }
      Self::Conditional { condition, .. } => condition.span(),
      Self::DeclarationReference(identifier) => identifier.span,
      Self::FunctionCall(call) => call.callee.span.to(call.span),
    }
  }

  /// True for `=`, `+=` and `-=` expressions.
  pub fn is_assignment(&self) -> bool {
    matches!(self, Self::BinaryOperand { operator, .. } if operator.is_assignment())
  }

  pub fn is_call(&self) -> bool {
    matches!(self, Self::FunctionCall(_))
  }

  /// Move every direct child expression onto `stack`.
  fn detach_children(&mut self, stack: &mut Vec<Expression>) {
    fn detach(boxed: &mut Expression, stack: &mut Vec<Expression>) {
      if boxed.has_children() {
        stack.push(std::mem::replace(boxed, Expression::placeholder()));
      }
    }

    match self {
      Self::Array { elements, .. } => stack.append(elements),
      Self::Block { statements, .. } => stack.append(statements),
      Self::BinaryOperand { lhs, rhs, .. } => {
        detach(lhs, stack);
        detach(rhs, stack);
      }
      Self::Conditional {
        condition,
        positive,
        negative,
      } => {
        detach(condition, stack);
        detach(positive, stack);
        if let Some(negative) = negative {
          detach(negative, stack);
        }
      }
      Self::FunctionCall(call) => {
        stack.append(&mut call.arguments);
        if let Some(block) = &mut call.block {
          detach(block, stack);
        }
      }
      Self::DeclarationReference(_)
      | Self::BooleanLiteral { .. }
      | Self::IntegerLiteral { .. }
      | Self::StringLiteral { .. } => {}
    }
  }

  fn has_children(&self) -> bool {
    match self {
      Self::Array { elements, .. } => !elements.is_empty(),
      Self::Block { statements, .. } => !statements.is_empty(),
      Self::BinaryOperand { .. } | Self::Conditional { .. } => true,
      Self::FunctionCall(call) => !call.arguments.is_empty() || call.block.is_some(),
      Self::DeclarationReference(_)
      | Self::BooleanLiteral { .. }
      | Self::IntegerLiteral { .. }
      | Self::StringLiteral { .. } => false,
    }
  }

  fn placeholder() -> Self {
    Self::BooleanLiteral {
      value: false,
      span: Span::default(),
    }
  }
}

/// Trees are torn down with an explicit stack: a long `a + b + ...` chain
/// nests one node per operator and would otherwise recurse once per term.
impl Drop for Expression {
  fn drop(&mut self) {
    if !self.has_children() {
      return;
    }
    let mut stack = Vec::new();
    self.detach_children(&mut stack);
    while let Some(mut expression) = stack.pop() {
      expression.detach_children(&mut stack);
    }
  }
}
