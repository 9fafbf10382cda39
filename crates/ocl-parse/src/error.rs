//! Lexical errors.

use crate::{Position, Span};

/// What went wrong while lexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// A quoted string with no closing quote on its line.
    UnterminatedString,
    /// A heredoc whose terminator line never appears.
    UnterminatedHeredoc,
    /// A heredoc opener followed by more text on the same line.
    InvalidHeredoc,
    /// An escape sequence outside the supported set.
    InvalidEscape(String),
}

/// A lexical error. Fatal to the whole parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    /// The offending source range.
    pub span: Span,
    /// Where the offending range starts.
    pub position: Position,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span, position: Position) -> Self {
        Self {
            kind,
            span,
            position,
        }
    }
}

impl std::fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErrorKind::UnterminatedString => write!(f, "unterminated string"),
            LexErrorKind::UnterminatedHeredoc => write!(f, "unterminated heredoc"),
            LexErrorKind::InvalidHeredoc => write!(f, "unexpected text after heredoc marker"),
            LexErrorKind::InvalidEscape(seq) => write!(f, "invalid escape sequence '{}'", seq),
        }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.kind, self.position)
    }
}

impl std::error::Error for LexError {}
