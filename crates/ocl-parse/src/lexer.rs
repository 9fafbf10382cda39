//! Significant-token lexer for OCL.
//!
//! Wraps the raw [`Tokenizer`], drops trivia, validates string escapes and
//! turns tokenizer error tokens into [`LexError`]s.

use ocl_tokenizer::{Position, Span, Token, TokenKind, Tokenizer};
use tracing::trace;

use crate::error::{LexError, LexErrorKind};
use crate::escape::validate_escapes;

/// A lexer producing the tokens the parser cares about.
#[derive(Clone)]
pub struct Lexer<'src> {
    tokenizer: Tokenizer<'src>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            tokenizer: Tokenizer::new(source),
        }
    }

    /// Get the next significant token. Returns an `Eof` token at the end,
    /// and keeps returning it.
    pub fn next_token(&mut self) -> Result<Token<'src>, LexError> {
        loop {
            let in_heredoc = self.tokenizer.in_heredoc();
            let token = self.tokenizer.next_token();
            match token.kind {
                kind if kind.is_trivia() => continue,
                TokenKind::Error => return Err(classify_error(&token, in_heredoc)),
                TokenKind::QuotedString => {
                    check_escapes(&token)?;
                    return Ok(token);
                }
                _ => return Ok(token),
            }
        }
    }

    /// Lex the whole input. The returned tokens always end with `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token<'src>>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if eof {
                break;
            }
        }
        trace!("Lexed {} tokens", tokens.len());
        Ok(tokens)
    }
}

fn classify_error(token: &Token<'_>, in_heredoc: bool) -> LexError {
    let kind = if in_heredoc {
        LexErrorKind::UnterminatedHeredoc
    } else if token.text.starts_with("<<") {
        LexErrorKind::InvalidHeredoc
    } else {
        LexErrorKind::UnterminatedString
    };
    LexError::new(kind, token.span, token.position)
}

fn check_escapes(token: &Token<'_>) -> Result<(), LexError> {
    // Skip the opening quote; strings never span lines so columns stay put.
    let inner = &token.text[1..token.text.len() - 1];
    let Some((offset, seq)) = validate_escapes(inner).into_iter().next() else {
        return Ok(());
    };
    let byte_offset = offset + 1;
    let start = token.span.start + byte_offset as u32;
    let position = Position {
        line: token.position.line,
        column: token.position.column + token.text[..byte_offset].chars().count() as u32,
        offset: start,
    };
    Err(LexError::new(
        LexErrorKind::InvalidEscape(seq.clone()),
        Span::new(start, start + seq.len() as u32),
        position,
    ))
}
