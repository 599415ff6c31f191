//! Grammar for description files.
//!
//! Statements and blocks are parsed by recursive descent; expressions use
//! precedence climbing over the ladder in [`Precedence`].

use super::ast::{Expression, FunctionCall, Identifier, Operator};
use super::diagnostic::DiagnosticSet;
use super::source::SourceFile;
use super::state::ParserState;
use super::token::{LiteralKind, Token, TokenKind};

/// Deepest nesting of lists, parentheses, blocks and right-associative
/// assignments accepted before the parser gives up on a statement.
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
  Assignment = 1,
  Or,
  And,
  Equality,
  Relation,
  Sum,
  Prefix,
  Call,
  Dot,
}

impl Precedence {
  fn next(self) -> Self {
    match self {
      Self::Assignment => Self::Or,
      Self::Or => Self::And,
      Self::And => Self::Equality,
      Self::Equality => Self::Relation,
      Self::Relation => Self::Sum,
      Self::Sum => Self::Prefix,
      Self::Prefix => Self::Call,
      Self::Call | Self::Dot => Self::Dot,
    }
  }
}

fn precedence(kind: TokenKind) -> Option<Precedence> {
  Some(match kind {
    TokenKind::Equal | TokenKind::PlusEqual | TokenKind::MinusEqual => Precedence::Assignment,
    TokenKind::PipePipe => Precedence::Or,
    TokenKind::AmpersandAmpersand => Precedence::And,
    TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equality,
    TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
      Precedence::Relation
    }
    TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
    TokenKind::LBracket | TokenKind::LParen => Precedence::Call,
    TokenKind::Dot => Precedence::Dot,
    _ => return None,
  })
}

/// Tokens that always end the expression being parsed.
fn is_break(kind: TokenKind) -> bool {
  matches!(
    kind,
    TokenKind::Identifier | TokenKind::LBrace | TokenKind::RBrace | TokenKind::If | TokenKind::Else
  )
}

/// Parse a whole description file into its top-level statements.
///
/// All statements are attempted even after an error so that several problems
/// can be reported at once; any diagnostic makes the parse fail.
pub fn parse(source: &SourceFile) -> Result<Vec<Expression>, DiagnosticSet> {
  let mut state = ParserState::new(source);
  let mut statements = Vec::new();

  while state.peek().is_some() {
    match statement(&mut state) {
      Some(statement) => statements.push(statement),
      None => synchronize(&mut state),
    }
  }

  if !state.diagnostics.is_empty() {
    return Err(state.diagnostics);
  }

  debug_assert!(state.peek().is_none(), "expected end of file");
  Ok(statements)
}

/// Skip ahead to something that looks like the start of a top-level statement.
fn synchronize(state: &mut ParserState<'_>) {
  let mut depth = 0usize;
  if let Some(token) = state.take() {
    match token.kind {
      TokenKind::LBrace => depth += 1,
      TokenKind::RBrace => depth = depth.saturating_sub(1),
      _ => {}
    }
  }

  while let Some(kind) = state.peek_kind() {
    if depth == 0 && matches!(kind, TokenKind::Identifier | TokenKind::If) {
      return;
    }
    match kind {
      TokenKind::LBrace => depth += 1,
      TokenKind::RBrace => depth = depth.saturating_sub(1),
      _ => {}
    }
    state.take();
  }
}

fn statement(state: &mut ParserState<'_>) -> Option<Expression> {
  let head = state.peek()?;
  if head.kind == TokenKind::If {
    return condition(state);
  }

  let errors = state.diagnostics.len();
  let expression = expression(state, Precedence::Assignment);
  match expression {
    Some(expression) if expression.is_call() || expression.is_assignment() => Some(expression),
    Some(expression) => {
      state.error("expected assignment or function call", expression.span());
      None
    }
    None => {
      if state.diagnostics.len() == errors {
        let span = state.location();
        state.error("expected assignment or function call", span);
      }
      None
    }
  }
}

fn condition(state: &mut ParserState<'_>) -> Option<Expression> {
  if !state.descend() {
    return None;
  }
  let result = conditional(state);
  state.ascend();
  result
}

fn conditional(state: &mut ParserState<'_>) -> Option<Expression> {
  state.take_if(TokenKind::If)?;

  if state.take_if(TokenKind::LParen).is_none() {
    state.expected(TokenKind::LParen);
    return None;
  }

  let predicate = expression(state, Precedence::Assignment)?;
  if predicate.is_assignment() {
    state.error("assignment is not permitted in 'if'", predicate.span());
    return None;
  }

  if state.take_if(TokenKind::RParen).is_none() {
    state.expected(TokenKind::RParen);
    return None;
  }

  if state.peek_kind() != Some(TokenKind::LBrace) {
    state.expected(TokenKind::LBrace);
    return None;
  }
  let positive = block(state)?;

  let negative = if state.take_if(TokenKind::Else).is_some() {
    match state.peek_kind() {
      Some(TokenKind::LBrace) => Some(block(state)?),
      Some(TokenKind::If) => Some(condition(state)?),
      _ => {
        let span = state.location();
        state.error("expected '{' or 'if' after 'else'", span);
        return None;
      }
    }
  } else {
    None
  };

  Some(Expression::Conditional {
    condition: Box::new(predicate),
    positive: Box::new(positive),
    negative: negative.map(Box::new),
  })
}

fn block(state: &mut ParserState<'_>) -> Option<Expression> {
  if !state.descend() {
    return None;
  }
  let result = braced(state);
  state.ascend();
  result
}

fn braced(state: &mut ParserState<'_>) -> Option<Expression> {
  let lbrace = state.take_if(TokenKind::LBrace)?;

  let mut statements = Vec::new();
  loop {
    match state.peek_kind() {
      Some(TokenKind::RBrace) => break,
      Some(_) => statements.push(statement(state)?),
      None => {
        state.expected(TokenKind::RBrace);
        return None;
      }
    }
  }

  let rbrace = state.take_if(TokenKind::RBrace)?;
  Some(Expression::Block {
    statements,
    span: lbrace.span.to(rbrace.span),
  })
}

/// Parse a comma separated sequence of `or`-level expressions up to, but not
/// including, `terminator`.
fn list(
  state: &mut ParserState<'_>,
  opener: Token,
  terminator: TokenKind,
  permit_trailing_comma: bool,
) -> Option<Vec<Expression>> {
  let mut elements = Vec::new();

  loop {
    match state.peek_kind() {
      None => {
        let span = opener.span.extended(state.location().end);
        state.error("unexpected end of file in list", span);
        return None;
      }
      Some(kind) if kind == terminator => break,
      Some(_) => {}
    }

    if !elements.is_empty() {
      if state.take_if(TokenKind::Comma).is_none() {
        state.expected(TokenKind::Comma);
        return None;
      }
      if permit_trailing_comma && state.peek_kind() == Some(terminator) {
        break;
      }
    }

    // Elements bind tighter than the `,` separating them.
    elements.push(expression(state, Precedence::Or)?);
  }

  Some(elements)
}

/// An identifier, optionally applied to an argument list and block.
fn apply(state: &mut ParserState<'_>) -> Option<Expression> {
  let token = state.take()?;
  let identifier = Identifier {
    name: state.text(&token).to_string(),
    span: token.span,
  };

  let Some(lparen) = state.take_if(TokenKind::LParen) else {
    return Some(Expression::DeclarationReference(identifier));
  };

  let arguments = list(state, lparen, TokenKind::RParen, false)?;
  let Some(rparen) = state.take_if(TokenKind::RParen) else {
    state.expected(TokenKind::RParen);
    return None;
  };

  let block = if state.peek_kind() == Some(TokenKind::LBrace) {
    Some(Box::new(block(state)?))
  } else {
    None
  };

  Some(Expression::FunctionCall(FunctionCall {
    callee: identifier,
    arguments,
    block,
    span: lparen.span.to(rparen.span),
  }))
}

fn string_literal(state: &mut ParserState<'_>, token: Token, terminated: bool) -> Expression {
  let raw = state.text(&token);
  let inner = raw.strip_prefix('"').unwrap_or(raw);
  let inner = if terminated {
    inner.strip_suffix('"').unwrap_or(inner)
  } else {
    state.error("unterminated string literal", token.span);
    inner
  };

  Expression::StringLiteral {
    value: unescape(inner),
    span: token.span,
  }
}

fn unescape(text: &str) -> String {
  let mut value = String::with_capacity(text.len());
  let mut chars = text.chars();
  while let Some(ch) = chars.next() {
    if ch != '\\' {
      value.push(ch);
      continue;
    }
    match chars.next() {
      Some('n') => value.push('\n'),
      Some('t') => value.push('\t'),
      Some(other) => value.push(other),
      None => value.push('\\'),
    }
  }
  value
}

fn primary(state: &mut ParserState<'_>) -> Option<Expression> {
  let Some(token) = state.peek() else {
    let span = state.location();
    state.error("unexpected end of file", span);
    return None;
  };

  match token.kind {
    TokenKind::Literal(LiteralKind::String { terminated }) => {
      state.take();
      Some(string_literal(state, token, terminated))
    }
    TokenKind::Literal(LiteralKind::Integer) => {
      state.take();
      match state.text(&token).parse::<i64>() {
        Ok(value) => Some(Expression::IntegerLiteral {
          value,
          span: token.span,
        }),
        Err(_) => {
          state.error("integer literal is out of range", token.span);
          None
        }
      }
    }
    TokenKind::True | TokenKind::False => {
      state.take();
      Some(Expression::BooleanLiteral {
        value: token.kind == TokenKind::True,
        span: token.span,
      })
    }
    TokenKind::LBracket => {
      let lbracket = state.take()?;
      let elements = list(state, lbracket, TokenKind::RBracket, true)?;
      let Some(rbracket) = state.take_if(TokenKind::RBracket) else {
        state.expected(TokenKind::RBracket);
        return None;
      };
      Some(Expression::Array {
        elements,
        span: lbracket.span.to(rbracket.span),
      })
    }
    TokenKind::LParen => {
      state.take();
      let inner = expression(state, Precedence::Or)?;
      if state.take_if(TokenKind::RParen).is_none() {
        state.expected(TokenKind::RParen);
        return None;
      }
      Some(inner)
    }
    TokenKind::Identifier => apply(state),
    TokenKind::Bang => {
      state.take();
      state.error("unary '!' is not supported", token.span);
      None
    }
    _ => {
      state.take();
      state.unexpected(token);
      None
    }
  }
}

fn expression(state: &mut ParserState<'_>, minimum: Precedence) -> Option<Expression> {
  if !state.descend() {
    return None;
  }
  let result = climb(state, minimum);
  state.ascend();
  result
}

fn climb(state: &mut ParserState<'_>, minimum: Precedence) -> Option<Expression> {
  let mut lhs = primary(state)?;

  while let Some(token) = state.peek() {
    if is_break(token.kind) {
      break;
    }
    let Some(level) = precedence(token.kind) else {
      break;
    };
    if level < minimum {
      break;
    }

    lhs = match Operator::from_token(token.kind) {
      Some(operator) if operator.is_assignment() => assignment(state, lhs, operator, token)?,
      Some(operator) => binary(state, lhs, operator, token, level)?,
      None => {
        // `.`, `[` and `(` in operator position: member access, subscripts
        // and calls on arbitrary expressions are not part of the language.
        state.take();
        state.unexpected(token);
        return None;
      }
    };
  }

  Some(lhs)
}

fn binary(
  state: &mut ParserState<'_>,
  lhs: Expression,
  operator: Operator,
  token: Token,
  level: Precedence,
) -> Option<Expression> {
  state.take();
  let errors = state.diagnostics.len();
  let Some(rhs) = expression(state, level.next()) else {
    if state.diagnostics.len() == errors {
      let span = state.location();
      let message = format!("expected right-hand side expression for '{}'", operator.as_str());
      state.error(message, span);
    }
    return None;
  };

  Some(Expression::BinaryOperand {
    operator,
    lhs: Box::new(lhs),
    rhs: Box::new(rhs),
    operator_span: token.span,
  })
}

fn assignment(
  state: &mut ParserState<'_>,
  lhs: Expression,
  operator: Operator,
  token: Token,
) -> Option<Expression> {
  if !matches!(lhs, Expression::DeclarationReference(_)) {
    state.error("the left-hand side of an assignment must be an identifier", lhs.span());
    return None;
  }

  state.take();
  let errors = state.diagnostics.len();
  let Some(rhs) = expression(state, Precedence::Assignment) else {
    if state.diagnostics.len() == errors {
      let span = state.location();
      state.error("expected right-hand side for assignment", span);
    }
    return None;
  };

  Some(Expression::BinaryOperand {
    operator,
    lhs: Box::new(lhs),
    rhs: Box::new(rhs),
    operator_span: token.span,
  })
}
