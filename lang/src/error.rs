//! Unified error handling for lumen.
//!
//! Every phase of the pipeline reports failures through [`LumenError`]. Each
//! variant carries the source location needed to render the caret diagnostic
//! at the top level.

use crate::lexer::token::{Token, TokenKind};
use crate::source::{Position, SourceText};
use std::fmt;

/// A unified error type covering lexing, parsing, compilation and execution.
#[derive(Debug, Clone, PartialEq)]
pub enum LumenError {
    /// No lexer rule matched at the cursor.
    UnknownCharacter { ch: char, position: Position },

    /// The parser required one specific token kind and found another.
    ExpectedToken { expected: TokenKind, got: Token },

    /// The parser found a token no rule can start with.
    UnexpectedToken { got: Token },

    /// A name did not resolve through the scope chain.
    SymbolNotFound { name: String, position: Position },

    /// An operation received a value of the wrong kind.
    TypeError {
        expected: &'static str,
        got: &'static str,
        position: Option<Position>,
    },

    /// Catch-all execution failure: bad assignment target, assignment to a
    /// constant, divide by zero, wrong arity, calling a non-callable.
    RuntimeError {
        message: String,
        position: Option<Position>,
    },
}

impl LumenError {
    pub fn unknown_character(ch: char, position: Position) -> Self {
        LumenError::UnknownCharacter { ch, position }
    }

    pub fn expected_token(expected: TokenKind, got: Token) -> Self {
        LumenError::ExpectedToken { expected, got }
    }

    pub fn unexpected_token(got: Token) -> Self {
        LumenError::UnexpectedToken { got }
    }

    pub fn symbol_not_found(name: impl Into<String>, position: Position) -> Self {
        LumenError::SymbolNotFound {
            name: name.into(),
            position,
        }
    }

    pub fn type_error(expected: &'static str, got: &'static str) -> Self {
        LumenError::TypeError {
            expected,
            got,
            position: None,
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        LumenError::RuntimeError {
            message: message.into(),
            position: None,
        }
    }

    pub fn runtime_at(message: impl Into<String>, position: Position) -> Self {
        LumenError::RuntimeError {
            message: message.into(),
            position: Some(position),
        }
    }

    /// Attach a source position to an error that does not have one yet.
    ///
    /// The engines use this to pin operator-table failures to the operator
    /// token that triggered them.
    pub fn at(self, position: Position) -> Self {
        match self {
            LumenError::TypeError {
                expected,
                got,
                position: None,
            } => LumenError::TypeError {
                expected,
                got,
                position: Some(position),
            },
            LumenError::RuntimeError {
                message,
                position: None,
            } => LumenError::RuntimeError {
                message,
                position: Some(position),
            },
            other => other,
        }
    }

    /// Short error kind name, used by the CLI's JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            LumenError::UnknownCharacter { .. } => "UnknownCharacter",
            LumenError::ExpectedToken { .. } => "ExpectedToken",
            LumenError::UnexpectedToken { .. } => "UnexpectedToken",
            LumenError::SymbolNotFound { .. } => "SymbolNotFound",
            LumenError::TypeError { .. } => "TypeError",
            LumenError::RuntimeError { .. } => "RuntimeError",
        }
    }

    /// The source position to annotate, if one is known.
    pub fn position(&self) -> Option<Position> {
        match self {
            LumenError::UnknownCharacter { position, .. } => Some(*position),
            LumenError::ExpectedToken { got, .. } => Some(got.position),
            LumenError::UnexpectedToken { got } => Some(got.position),
            LumenError::SymbolNotFound { position, .. } => Some(*position),
            LumenError::TypeError { position, .. } => *position,
            LumenError::RuntimeError { position, .. } => *position,
        }
    }

    /// Render the full diagnostic: the message, the offending source line,
    /// and a caret pointing at the column.
    pub fn render(&self, source: &SourceText) -> String {
        match self.position() {
            Some(position) => format!("Error: {}\n{}", self, source.annotate(position)),
            None => format!("Error: {}", self),
        }
    }
}

fn describe_found(token: &Token) -> String {
    if token.kind == TokenKind::EndOfSource {
        "end of input".to_string()
    } else {
        format!("'{}'", token.text)
    }
}

impl fmt::Display for LumenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LumenError::UnknownCharacter { ch, position } => {
                write!(f, "unknown character '{}' at {}", ch, position)
            }
            LumenError::ExpectedToken { expected, got } => {
                write!(
                    f,
                    "expected {} but found {} at {}",
                    expected.describe(),
                    describe_found(got),
                    got.position
                )
            }
            LumenError::UnexpectedToken { got } => {
                write!(
                    f,
                    "unexpected {} at {}",
                    describe_found(got),
                    got.position
                )
            }
            LumenError::SymbolNotFound { name, position } => {
                write!(f, "no such symbol '{}' referenced at {}", name, position)
            }
            LumenError::TypeError {
                expected,
                got,
                position,
            } => {
                write!(f, "expected {} but got {}", expected, got)?;
                if let Some(position) = position {
                    write!(f, " at {}", position)?;
                }
                Ok(())
            }
            LumenError::RuntimeError { message, position } => {
                write!(f, "{}", message)?;
                if let Some(position) = position {
                    write!(f, " at {}", position)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for LumenError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_not_found_message() {
        let error = LumenError::symbol_not_found("x", Position::new(2, 4));
        assert_eq!(
            error.to_string(),
            "no such symbol 'x' referenced at line 3, character 5"
        );
    }

    #[test]
    fn expected_token_message() {
        let got = Token::new(TokenKind::RightBrace, "}", Position::new(0, 3));
        let error = LumenError::expected_token(TokenKind::Semicolon, got);
        assert_eq!(
            error.to_string(),
            "expected ';' but found '}' at line 1, character 4"
        );
    }

    #[test]
    fn end_of_source_reads_as_end_of_input() {
        let got = Token::new(TokenKind::EndOfSource, "", Position::new(0, 7));
        let error = LumenError::unexpected_token(got);
        assert_eq!(error.to_string(), "unexpected end of input at line 1, character 8");
    }

    #[test]
    fn at_fills_missing_positions_only() {
        let error = LumenError::runtime("divide by zero").at(Position::new(1, 2));
        assert_eq!(error.position(), Some(Position::new(1, 2)));

        let pinned = LumenError::runtime_at("divide by zero", Position::new(0, 0))
            .at(Position::new(5, 5));
        assert_eq!(pinned.position(), Some(Position::new(0, 0)));
    }

    #[test]
    fn render_includes_caret_line() {
        let source = SourceText::new("println(missing);");
        let error = LumenError::symbol_not_found("missing", Position::new(0, 8));
        assert_eq!(
            error.render(&source),
            "Error: no such symbol 'missing' referenced at line 1, character 9\n\
             println(missing);\n\
             ________^"
        );
    }
}
