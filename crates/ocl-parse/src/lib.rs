//! Parser for OCL, the Octopus configuration language.
//!
//! [`parse`] turns source text into a [`Document`]: an arena of blocks,
//! attributes, dictionaries, arrays and literals in source order. Lexical
//! errors (unterminated strings or heredocs, bad escapes) abort the parse;
//! anything else that does not fit the grammar is kept as a `Recovery` node.

pub use ocl_tokenizer::{Position, Span, Token, TokenKind, Tokenizer};

mod error;
pub use error::{LexError, LexErrorKind};

mod escape;
pub use escape::{decode_quoted, unescape};

mod lexer;
pub use lexer::Lexer;

pub mod ast;
pub use ast::{
    Array, Attribute, Block, Dictionary, Document, Literal, LiteralKind, Node, NodeId, NodeKind,
    NodeTag, Number, Scalar,
};

mod parser;
pub use parser::{DEFAULT_MAX_DEPTH, Parser};

/// Parse an OCL document with the default settings.
pub fn parse(source: &str) -> Result<Document, LexError> {
    Parser::new(source).parse()
}
