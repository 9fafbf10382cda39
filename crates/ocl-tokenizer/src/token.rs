//! Token types for the OCL tokenizer.

use crate::{Position, Span};

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structural tokens
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `=`
    Equals,
    /// `,`
    Comma,

    // Atoms
    /// Identifier: `step`, `Octopus.Action.Script`
    Ident,
    /// Quoted string, quotes included: `"hello\n"`
    QuotedString,
    /// Number: `42`, `-1.5e3`
    Number,
    /// `true` or `false`
    Bool,
    /// Heredoc opener: `<<EOT` or `<<-EOT`, including the rest of the line
    HeredocStart,
    /// Heredoc body, verbatim, without the line break before the terminator
    HeredocContent,
    /// Heredoc terminator: the preceding line break, indentation and identifier
    HeredocEnd,

    // Trivia
    /// Line comment: `# ...` or `// ...`
    Comment,
    /// Horizontal whitespace: spaces and tabs
    Whitespace,
    /// Newline: `\n` or `\r\n`
    Newline,

    // Special tokens
    /// A character that starts no token. The parser recovers from these.
    Unknown,
    /// End of file
    Eof,
    /// Unterminated string or heredoc, or a malformed heredoc opener
    Error,
}

impl TokenKind {
    /// Whether this token is trivia (whitespace or comments).
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment
        )
    }

    /// Whether this token can start an attribute value.
    pub fn is_value_start(&self) -> bool {
        matches!(
            self,
            TokenKind::QuotedString
                | TokenKind::Number
                | TokenKind::Bool
                | TokenKind::HeredocStart
                | TokenKind::LBrace
                | TokenKind::LBracket
        )
    }
}

/// A token with its kind, location, and source text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    /// The span in the source text.
    pub span: Span,
    /// Where the token starts.
    pub position: Position,
    /// The source text of this token.
    pub text: &'src str,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, span: Span, position: Position, text: &'src str) -> Self {
        Self {
            kind,
            span,
            position,
            text,
        }
    }
}
