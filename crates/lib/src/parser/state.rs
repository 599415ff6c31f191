//! Token cursor used by the parser.

use std::collections::VecDeque;

use super::diagnostic::{Diagnostic, DiagnosticSet, Level};
use super::grammar::MAX_NESTING_DEPTH;
use super::lexer::Lexer;
use super::source::{SourceFile, Span};
use super::token::{Token, TokenKind};

/// Pulls tokens from the lexer on demand and keeps a small lookahead queue.
///
/// Comment tokens are dropped here so the grammar never sees them.
pub(crate) struct ParserState<'a> {
  pub source: &'a SourceFile,
  pub diagnostics: DiagnosticSet,
  lexer: Lexer<'a>,
  lookahead: VecDeque<Token>,
  /// End of the most recently consumed token.
  cursor: usize,
  /// Nested expressions and blocks currently open.
  depth: usize,
}

impl<'a> ParserState<'a> {
  pub fn new(source: &'a SourceFile) -> Self {
    Self {
      source,
      diagnostics: DiagnosticSet::new(),
      lexer: Lexer::new(source.text()),
      lookahead: VecDeque::new(),
      cursor: 0,
      depth: 0,
    }
  }

  fn pull(&mut self) -> Option<Token> {
    self.lexer.by_ref().find(|token| token.kind != TokenKind::Comment)
  }

  /// An empty span at the end of the last consumed token.
  pub fn location(&self) -> Span {
    Span::empty(self.cursor)
  }

  pub fn peek(&mut self) -> Option<Token> {
    self.peek_nth(0)
  }

  pub fn peek_kind(&mut self) -> Option<TokenKind> {
    self.peek().map(|token| token.kind)
  }

  /// Look `n` tokens ahead without consuming anything.
  pub fn peek_nth(&mut self, n: usize) -> Option<Token> {
    while self.lookahead.len() <= n {
      let token = self.pull()?;
      self.lookahead.push_back(token);
    }
    self.lookahead.get(n).copied()
  }

  pub fn take(&mut self) -> Option<Token> {
    let token = match self.lookahead.pop_front() {
      Some(token) => token,
      None => self.pull()?,
    };
    self.cursor = token.span.end;
    Some(token)
  }

  /// Consume the next token only when it has the given kind.
  pub fn take_if(&mut self, kind: TokenKind) -> Option<Token> {
    if self.peek_kind()? == kind { self.take() } else { None }
  }

  pub fn text(&self, token: &Token) -> &'a str {
    self.source.slice(token.span)
  }

  pub fn error(&mut self, message: impl Into<String>, span: Span) {
    self.report(Level::Error, message, span);
  }

  pub fn expected(&mut self, kind: TokenKind) {
    let span = self.location();
    self.error(format!("expected {}", kind), span);
  }

  pub fn unexpected(&mut self, token: Token) {
    let message = match token.kind {
      TokenKind::Invalid => format!("invalid character '{}'", self.text(&token)),
      kind => format!("unexpected {}", kind),
    };
    self.error(message, token.span);
  }

  pub fn report(&mut self, level: Level, message: impl Into<String>, span: Span) {
    let location = self.source.location(span.start);
    self.diagnostics.insert(Diagnostic {
      level,
      message: message.into(),
      span,
      location,
    });
  }

  /// Enter one more level of nesting, reporting an error and refusing once
  /// [`MAX_NESTING_DEPTH`] is reached. Every successful call must be paired
  /// with [`ParserState::ascend`].
  pub fn descend(&mut self) -> bool {
    if self.depth >= MAX_NESTING_DEPTH {
      let span = match self.peek() {
        Some(token) => token.span,
        None => self.location(),
      };
      self.error(format!("nesting exceeds the limit of {} levels", MAX_NESTING_DEPTH), span);
      return false;
    }
    self.depth += 1;
    true
  }

  pub fn ascend(&mut self) {
    self.depth = self.depth.saturating_sub(1);
  }
}
