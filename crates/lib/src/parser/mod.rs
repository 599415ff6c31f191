//! Front end for description files: lexing and parsing into an AST.
//!
//! ```
//! use antimony_lib::parser::{parse, SourceFile};
//!
//! let source = SourceFile::from_buffer(r#"x = 1 + 2"#, "BUILD.gn");
//! let statements = parse(&source).unwrap();
//! assert_eq!(statements.len(), 1);
//! ```

pub mod ast;
pub mod diagnostic;
pub mod grammar;
pub mod lexer;
pub mod source;
mod state;
pub mod token;

pub use ast::{Expression, FunctionCall, Identifier, Operator};
pub use diagnostic::{Diagnostic, DiagnosticSet, Level};
pub use grammar::{parse, MAX_NESTING_DEPTH};
pub use lexer::Lexer;
pub use source::{Location, SourceFile, Span};
pub use token::{LiteralKind, Token, TokenKind};

#[cfg(test)]
mod tests {
  use super::*;

  fn parse_text(text: &str) -> Result<Vec<Expression>, DiagnosticSet> {
    parse(&SourceFile::from_buffer(text, "BUILD.gn"))
  }

  fn parse_one(text: &str) -> Expression {
    let mut statements = parse_text(text).unwrap_or_else(|e| panic!("parse failed: {}", e));
    assert_eq!(statements.len(), 1);
    statements.remove(0)
  }

  #[test]
  fn assignment_of_sum() {
    let statement = parse_one("x = 1 + 2");
    let Expression::BinaryOperand {
      operator: Operator::Assign,
      lhs,
      rhs,
      ..
    } = &statement
    else {
      panic!("expected assignment");
    };
    assert!(matches!(lhs.as_ref(), Expression::DeclarationReference(id) if id.name == "x"));
    match rhs.as_ref() {
      Expression::BinaryOperand {
        operator: Operator::Add,
        lhs,
        rhs,
        ..
      } => {
        assert!(matches!(lhs.as_ref(), Expression::IntegerLiteral { value: 1, .. }));
        assert!(matches!(rhs.as_ref(), Expression::IntegerLiteral { value: 2, .. }));
      }
      other => panic!("expected addition, got {:?}", other),
    }
  }

  #[test]
  fn else_if_chain_nests() {
    let statement = parse_one("if (a) { } else if (b) { } else { }");
    let Expression::Conditional { negative, .. } = &statement else {
      panic!("expected conditional");
    };
    let negative = negative.as_deref().expect("outer conditional has an else branch");
    let Expression::Conditional {
      condition,
      negative: terminal,
      ..
    } = negative
    else {
      panic!("expected nested conditional");
    };
    assert!(matches!(condition.as_ref(), Expression::DeclarationReference(id) if id.name == "b"));
    assert!(matches!(
      terminal.as_deref(),
      Some(Expression::Block { statements, .. }) if statements.is_empty()
    ));
  }

  #[test]
  fn call_with_block() {
    let statement = parse_one(
      r#"
        executable("app") {
          sources = ["a.swift", "b.swift",]
          deps = [":lib"]
        }
      "#,
    );
    let Expression::FunctionCall(call) = &statement else {
      panic!("expected call");
    };
    assert_eq!(call.callee.name, "executable");
    assert_eq!(call.arguments.len(), 1);
    let Some(block) = call.block.as_deref() else {
      panic!("expected block");
    };
    assert!(matches!(block, Expression::Block { statements, .. } if statements.len() == 2));
  }

  #[test]
  fn string_escapes_are_decoded() {
    let statement = parse_one(r#"s = "say \"hi\"""#);
    let Expression::BinaryOperand { rhs, .. } = &statement else {
      panic!("expected assignment");
    };
    assert!(matches!(
      rhs.as_ref(),
      Expression::StringLiteral { value, .. } if value == "say \"hi\""
    ));
  }

  #[test]
  fn precedence_ladder() {
    // `a || b && c == d` groups as `a || (b && (c == d))`
    let statement = parse_one("x = a || b && c == d");
    let Expression::BinaryOperand { rhs, .. } = &statement else {
      panic!("expected assignment");
    };
    let Expression::BinaryOperand {
      operator: Operator::Or,
      rhs: and,
      ..
    } = rhs.as_ref()
    else {
      panic!("expected ||");
    };
    let Expression::BinaryOperand {
      operator: Operator::And,
      rhs: eq,
      ..
    } = and.as_ref()
    else {
      panic!("expected &&");
    };
    assert!(matches!(
      eq.as_ref(),
      Expression::BinaryOperand {
        operator: Operator::Equal,
        ..
      }
    ));
  }

  #[test]
  fn subtraction_is_left_associative() {
    let statement = parse_one("x = 10 - 3 - 2");
    let Expression::BinaryOperand { rhs, .. } = &statement else {
      panic!("expected assignment");
    };
    let Expression::BinaryOperand {
      operator: Operator::Subtract,
      lhs,
      rhs,
      ..
    } = rhs.as_ref()
    else {
      panic!("expected subtraction");
    };
    assert!(matches!(rhs.as_ref(), Expression::IntegerLiteral { value: 2, .. }));
    assert!(matches!(
      lhs.as_ref(),
      Expression::BinaryOperand {
        operator: Operator::Subtract,
        ..
      }
    ));
  }

  #[test]
  fn bare_expression_statement_is_rejected() {
    let err = parse_text("1 + 2").unwrap_err();
    assert!(err.to_string().contains("expected assignment or function call"), "{}", err);
  }

  #[test]
  fn non_identifier_assignment_target_is_rejected() {
    let err = parse_text(r#"f() = 1"#).unwrap_err();
    assert!(err.to_string().contains("left-hand side"), "{}", err);
  }

  #[test]
  fn assignment_in_condition_is_rejected() {
    let err = parse_text("if (a = true) { }").unwrap_err();
    assert!(err.to_string().contains("assignment is not permitted in 'if'"), "{}", err);
  }

  #[test]
  fn if_requires_braces() {
    let err = parse_text("if (a) x = 1").unwrap_err();
    assert!(err.to_string().contains("expected '{'"), "{}", err);
  }

  #[test]
  fn comments_are_ignored() {
    let statements = parse_text("# leading\nx = 1 # trailing\n# done").unwrap();
    assert_eq!(statements.len(), 1);
  }

  #[test]
  fn several_errors_are_collected() {
    let err = parse_text("x = \ny = @\nz = 3\nw").unwrap_err();
    assert!(err.len() >= 2, "expected multiple diagnostics: {}", err);
  }

  #[test]
  fn invalid_character_is_reported_with_location() {
    let err = parse_text("x = 1\ny = @").unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("BUILD.gn:2:5: error: invalid character '@'"), "{}", rendered);
  }

  #[test]
  fn unterminated_list_reports_end_of_file() {
    let err = parse_text("x = [1, 2").unwrap_err();
    assert!(err.to_string().contains("unexpected end of file in list"), "{}", err);
  }

  #[test]
  fn grouping_parentheses() {
    let statement = parse_one("x = (1 + 2) == 3");
    let Expression::BinaryOperand { rhs, .. } = &statement else {
      panic!("expected assignment");
    };
    assert!(matches!(
      rhs.as_ref(),
      Expression::BinaryOperand {
        operator: Operator::Equal,
        ..
      }
    ));
  }

  #[test]
  fn long_sum_parses_without_deep_recursion() {
    let text = format!("x = {}", vec!["1"; 10_000].join(" + "));
    let statement = parse_one(&text);
    assert!(statement.is_assignment());
  }

  #[test]
  fn deeply_nested_list_is_rejected() {
    let depth = 10_000;
    let text = format!("x = {}{}", "[".repeat(depth), "]".repeat(depth));
    let err = parse_text(&text).unwrap_err();
    assert_eq!(err.len(), 1, "{}", err);
    assert!(err.to_string().contains("nesting exceeds the limit of 128 levels"), "{}", err);
  }

  #[test]
  fn nesting_below_the_limit_is_accepted() {
    let depth = MAX_NESTING_DEPTH - 8;
    let text = format!("x = {}{}", "(".repeat(depth) + "1", ")".repeat(depth));
    assert!(parse_text(&text).is_ok());
  }

  #[test]
  fn deeply_nested_blocks_are_rejected() {
    let depth = 1_000;
    let text = format!("{}{}", "if (true) { ".repeat(depth), "} ".repeat(depth));
    let err = parse_text(&text).unwrap_err();
    assert!(err.to_string().contains("nesting exceeds"), "{}", err);
  }

  #[test]
  fn compound_assignment_parses() {
    let statement = parse_one(r#"sources += ["c.swift"]"#);
    assert!(matches!(
      statement,
      Expression::BinaryOperand {
        operator: Operator::AddAssign,
        ..
      }
    ));
  }
}
