//! Lexical tokens.

use std::fmt;

use super::source::Span;

/// Literal classes recognised by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
  Integer,
  /// A string literal. `terminated` is false when the closing quote was
  /// never found before end of input.
  String { terminated: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  Invalid,
  Comment,
  Identifier,
  Literal(LiteralKind),

  // keywords
  If,
  Else,
  True,
  False,

  // assignment operators
  Equal,
  PlusEqual,
  MinusEqual,

  // unary operators
  Bang,

  // binary operators
  Plus,
  Minus,
  Less,
  LessEqual,
  Greater,
  GreaterEqual,
  EqualEqual,
  BangEqual,
  AmpersandAmpersand,
  PipePipe,

  // punctuation
  LParen,
  RParen,
  LBrace,
  RBrace,
  LBracket,
  RBracket,
  Comma,
  Dot,
}

impl TokenKind {
  /// Map an identifier-shaped word to its keyword kind, if it is one.
  pub fn keyword(word: &str) -> Option<Self> {
    match word {
      "if" => Some(Self::If),
      "else" => Some(Self::Else),
      "true" => Some(Self::True),
      "false" => Some(Self::False),
      _ => None,
    }
  }

  /// The spelling used in diagnostics.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Invalid => "<invalid>",
      Self::Comment => "<comment>",
      Self::Identifier => "identifier",
      Self::Literal(LiteralKind::Integer) => "integer literal",
      Self::Literal(LiteralKind::String { .. }) => "string literal",
      Self::If => "if",
      Self::Else => "else",
      Self::True => "true",
      Self::False => "false",
      Self::Equal => "=",
      Self::PlusEqual => "+=",
      Self::MinusEqual => "-=",
      Self::Bang => "!",
      Self::Plus => "+",
      Self::Minus => "-",
      Self::Less => "<",
      Self::LessEqual => "<=",
      Self::Greater => ">",
      Self::GreaterEqual => ">=",
      Self::EqualEqual => "==",
      Self::BangEqual => "!=",
      Self::AmpersandAmpersand => "&&",
      Self::PipePipe => "||",
      Self::LParen => "(",
      Self::RParen => ")",
      Self::LBrace => "{",
      Self::RBrace => "}",
      Self::LBracket => "[",
      Self::RBracket => "]",
      Self::Comma => ",",
      Self::Dot => ".",
    }
  }

  pub fn is_assignment(&self) -> bool {
    matches!(self, Self::Equal | Self::PlusEqual | Self::MinusEqual)
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "'{}'", self.as_str())
  }
}

/// A classified slice of the source buffer.
///
/// For string literals the span includes both quotes (or runs to end of input
/// when the literal is unterminated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
  pub kind: TokenKind,
  pub span: Span,
}

impl Token {
  pub fn new(kind: TokenKind, span: Span) -> Self {
    Self { kind, span }
  }
}
