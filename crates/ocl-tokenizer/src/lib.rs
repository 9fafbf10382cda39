//! A tokenizer for OCL
//!
//! The tokenizer is lossless: whitespace, newlines and comments come out as
//! tokens so that consumers can decide what is trivia.

mod span;
pub use span::{Position, Span};

mod token;
pub use token::{Token, TokenKind};

mod tokenizer;
pub use tokenizer::Tokenizer;
