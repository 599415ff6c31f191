//! Tokenizer for description files.
//!
//! The lexer is a forward-only iterator over a source buffer. It never buffers
//! more than the token it is producing, and it never fails: bytes it does not
//! understand become [`TokenKind::Invalid`] tokens so that the parser can
//! report them with a precise location.

use super::source::Span;
use super::token::{LiteralKind, Token, TokenKind};

/// Two-character operators, matched before their one-character prefixes.
const COMPOUND_OPERATORS: &[(&str, TokenKind)] = &[
  ("+=", TokenKind::PlusEqual),
  ("-=", TokenKind::MinusEqual),
  ("==", TokenKind::EqualEqual),
  ("!=", TokenKind::BangEqual),
  ("<=", TokenKind::LessEqual),
  (">=", TokenKind::GreaterEqual),
  ("&&", TokenKind::AmpersandAmpersand),
  ("||", TokenKind::PipePipe),
];

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
  text: &'a str,
  cursor: usize,
}

impl<'a> Lexer<'a> {
  pub fn new(text: &'a str) -> Self {
    Self { text, cursor: 0 }
  }

  fn rest(&self) -> &'a str {
    &self.text[self.cursor..]
  }

  fn peek(&self) -> Option<char> {
    self.rest().chars().next()
  }

  fn peek_second(&self) -> Option<char> {
    self.rest().chars().nth(1)
  }

  fn bump(&mut self) -> Option<char> {
    let ch = self.peek()?;
    self.cursor += ch.len_utf8();
    Some(ch)
  }

  fn take_while(&mut self, predicate: impl Fn(char) -> bool) {
    while let Some(ch) = self.peek() {
      if !predicate(ch) {
        break;
      }
      self.cursor += ch.len_utf8();
    }
  }

  fn skip_whitespace(&mut self) {
    self.take_while(char::is_whitespace);
  }

  fn token(&self, kind: TokenKind, start: usize) -> Token {
    Token::new(kind, Span::new(start, self.cursor))
  }

  fn scan_comment(&mut self, start: usize) -> Token {
    self.take_while(|ch| ch != '\n');
    self.token(TokenKind::Comment, start)
  }

  fn scan_word(&mut self, start: usize) -> Token {
    self.take_while(|ch| ch.is_alphanumeric() || ch == '_');
    let word = &self.text[start..self.cursor];
    let kind = TokenKind::keyword(word).unwrap_or(TokenKind::Identifier);
    self.token(kind, start)
  }

  fn scan_integer(&mut self, start: usize) -> Token {
    if self.peek() == Some('-') {
      self.bump();
    }
    self.take_while(|ch| ch.is_ascii_digit());
    self.token(TokenKind::Literal(LiteralKind::Integer), start)
  }

  fn scan_string(&mut self, start: usize) -> Token {
    // opening quote
    self.bump();

    let mut escape = false;
    let mut terminated = false;
    while let Some(ch) = self.bump() {
      match ch {
        '"' if !escape => {
          terminated = true;
          break;
        }
        '\\' => escape = !escape,
        _ => escape = false,
      }
    }

    self.token(TokenKind::Literal(LiteralKind::String { terminated }), start)
  }

  fn scan_punctuation(&mut self, start: usize) -> Token {
    for (spelling, kind) in COMPOUND_OPERATORS {
      if self.rest().starts_with(spelling) {
        self.cursor += spelling.len();
        return self.token(*kind, start);
      }
    }

    let kind = match self.bump() {
      Some('+') => TokenKind::Plus,
      Some('-') => TokenKind::Minus,
      Some('!') => TokenKind::Bang,
      Some('=') => TokenKind::Equal,
      Some('<') => TokenKind::Less,
      Some('>') => TokenKind::Greater,
      Some('.') => TokenKind::Dot,
      Some(',') => TokenKind::Comma,
      Some('(') => TokenKind::LParen,
      Some(')') => TokenKind::RParen,
      Some('[') => TokenKind::LBracket,
      Some(']') => TokenKind::RBracket,
      Some('{') => TokenKind::LBrace,
      Some('}') => TokenKind::RBrace,
      _ => TokenKind::Invalid,
    };
    self.token(kind, start)
  }
}

impl Iterator for Lexer<'_> {
  type Item = Token;

  fn next(&mut self) -> Option<Token> {
    self.skip_whitespace();

    let start = self.cursor;
    let head = self.peek()?;

    let token = match head {
      '#' => self.scan_comment(start),
      '"' => self.scan_string(start),
      ch if ch.is_alphabetic() || ch == '_' => self.scan_word(start),
      ch if ch.is_ascii_digit() => self.scan_integer(start),
      '-' if self.peek_second().is_some_and(|ch| ch.is_ascii_digit()) => self.scan_integer(start),
      _ => self.scan_punctuation(start),
    };

    Some(token)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(text: &str) -> Vec<TokenKind> {
    Lexer::new(text).map(|token| token.kind).collect()
  }

  #[test]
  fn escaped_quotes_stay_inside_string() {
    let text = r#""foo \"bar\" baz""#;
    let tokens: Vec<_> = Lexer::new(text).collect();
    assert_eq!(tokens.len(), 1);
    assert_eq!(
      tokens[0].kind,
      TokenKind::Literal(LiteralKind::String { terminated: true })
    );
    assert_eq!(&text[tokens[0].span.start..tokens[0].span.end], text);
  }

  #[test]
  fn compound_assignment_is_one_token() {
    assert_eq!(
      kinds("a+=1"),
      vec![
        TokenKind::Identifier,
        TokenKind::PlusEqual,
        TokenKind::Literal(LiteralKind::Integer),
      ]
    );
  }

  #[test]
  fn keywords_are_classified() {
    assert_eq!(
      kinds("if else true false iffy"),
      vec![
        TokenKind::If,
        TokenKind::Else,
        TokenKind::True,
        TokenKind::False,
        TokenKind::Identifier,
      ]
    );
  }

  #[test]
  fn negative_integer_versus_minus() {
    assert_eq!(
      kinds("-12 a - b"),
      vec![
        TokenKind::Literal(LiteralKind::Integer),
        TokenKind::Identifier,
        TokenKind::Minus,
        TokenKind::Identifier,
      ]
    );
  }

  #[test]
  fn integer_stops_at_first_non_digit() {
    let tokens: Vec<_> = Lexer::new("42)").collect();
    assert_eq!(tokens[0].span, Span::new(0, 2));
    assert_eq!(tokens[1].kind, TokenKind::RParen);
  }

  #[test]
  fn comments_run_to_end_of_line() {
    assert_eq!(
      kinds("# hello\nx"),
      vec![TokenKind::Comment, TokenKind::Identifier]
    );
  }

  #[test]
  fn operators_are_greedy() {
    assert_eq!(
      kinds("== != <= >= && || < > = !"),
      vec![
        TokenKind::EqualEqual,
        TokenKind::BangEqual,
        TokenKind::LessEqual,
        TokenKind::GreaterEqual,
        TokenKind::AmpersandAmpersand,
        TokenKind::PipePipe,
        TokenKind::Less,
        TokenKind::Greater,
        TokenKind::Equal,
        TokenKind::Bang,
      ]
    );
  }

  #[test]
  fn unknown_bytes_become_invalid_tokens() {
    assert_eq!(
      kinds("a @ & b"),
      vec![
        TokenKind::Identifier,
        TokenKind::Invalid,
        TokenKind::Invalid,
        TokenKind::Identifier,
      ]
    );
  }

  #[test]
  fn unterminated_string_ends_at_input_end() {
    let tokens: Vec<_> = Lexer::new(r#""abc\"#).collect();
    assert_eq!(tokens.len(), 1);
    assert_eq!(
      tokens[0].kind,
      TokenKind::Literal(LiteralKind::String { terminated: false })
    );
    assert_eq!(tokens[0].span.end, 5);
  }

  #[test]
  fn sequence_is_finite() {
    let mut lexer = Lexer::new("x");
    assert!(lexer.next().is_some());
    assert!(lexer.next().is_none());
    assert!(lexer.next().is_none());
  }
}
