//! Tokenizer for the OCL configuration language.

use crate::{Position, Span, Token, TokenKind};
use tracing::trace;

/// A tokenizer that produces tokens from OCL source text.
#[derive(Clone)]
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
    line: u32,
    column: u32,

    /// Set between a heredoc opener and its terminator.
    heredoc_state: Option<HeredocState<'src>>,
}

/// State for tracking heredoc bodies.
#[derive(Debug, Clone, Copy)]
struct HeredocState<'src> {
    /// The terminator identifier (e.g., "EOT" for `<<EOT`)
    delimiter: &'src str,
    /// `<<-` form: the terminator may be indented.
    indented: bool,
}

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
            line: 1,
            column: 1,
            heredoc_state: None,
        }
    }

    /// Get the current location.
    #[inline]
    pub fn location(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Whether the tokenizer is between a heredoc opener and its terminator.
    #[inline]
    pub fn in_heredoc(&self) -> bool {
        self.heredoc_state.is_some()
    }

    /// Peek at the next character without consuming it.
    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Peek at the nth character (0-indexed) without consuming.
    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    /// Advance by one character and return it.
    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Advance by n bytes. `n` must fall on a char boundary.
    fn advance_by(&mut self, n: usize) {
        let rest = self.remaining;
        for c in rest[..n].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += n as u32;
        self.remaining = &rest[n..];
    }

    /// Check if the remaining text starts with the given prefix.
    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    /// Length of the line break at the current position (0 if there is none).
    fn line_break_len(&self) -> usize {
        if self.starts_with("\r\n") {
            2
        } else if self.starts_with("\n") {
            1
        } else {
            0
        }
    }

    /// Create a token from the given start position to current position.
    fn token(&self, kind: TokenKind, start: Position) -> Token<'src> {
        let span = Span::new(start.offset, self.pos);
        let text = &self.source[start.offset as usize..self.pos as usize];
        trace!("Token {:?} at {}: {:?}", kind, start, text);
        Token::new(kind, span, start, text)
    }

    fn single(&mut self, kind: TokenKind, start: Position) -> Token<'src> {
        self.advance();
        self.token(kind, start)
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        if let Some(state) = self.heredoc_state {
            return self.tokenize_heredoc_body(state);
        }

        let start = self.location();
        let Some(c) = self.peek() else {
            return self.token(TokenKind::Eof, start);
        };

        match c {
            '{' => self.single(TokenKind::LBrace, start),
            '}' => self.single(TokenKind::RBrace, start),
            '[' => self.single(TokenKind::LBracket, start),
            ']' => self.single(TokenKind::RBracket, start),
            '=' => self.single(TokenKind::Equals, start),
            ',' => self.single(TokenKind::Comma, start),

            '"' => self.tokenize_quoted_string(),

            '#' => self.tokenize_comment(),
            '/' if self.starts_with("//") => self.tokenize_comment(),

            '<' if self.starts_with("<<") => self.tokenize_heredoc_start(),

            ' ' | '\t' => self.tokenize_whitespace(),

            '\n' => self.single(TokenKind::Newline, start),
            '\r' if self.peek_nth(1) == Some('\n') => {
                self.advance();
                self.advance();
                self.token(TokenKind::Newline, start)
            }

            '-' if matches!(self.peek_nth(1), Some(d) if d.is_ascii_digit()) => {
                self.tokenize_number()
            }
            _ if c.is_ascii_digit() => self.tokenize_number(),

            _ if is_ident_start(c) => self.tokenize_ident(),

            _ => self.single(TokenKind::Unknown, start),
        }
    }

    /// Tokenize horizontal whitespace (spaces and tabs).
    fn tokenize_whitespace(&mut self) -> Token<'src> {
        let start = self.location();
        while let Some(' ' | '\t') = self.peek() {
            self.advance();
        }
        self.token(TokenKind::Whitespace, start)
    }

    /// Tokenize an identifier, or a boolean keyword.
    fn tokenize_ident(&mut self) -> Token<'src> {
        let start = self.location();
        self.advance();
        while let Some(c) = self.peek() {
            if is_ident_char(c) {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start.offset as usize..self.pos as usize];
        let kind = if text == "true" || text == "false" {
            TokenKind::Bool
        } else {
            TokenKind::Ident
        };
        self.token(kind, start)
    }

    /// Tokenize a number: `-?digits(.digits)?([eE][+-]?digits)?`.
    fn tokenize_number(&mut self) -> Token<'src> {
        let start = self.location();
        if self.peek() == Some('-') {
            self.advance();
        }
        self.eat_digits();

        if self.peek() == Some('.') && matches!(self.peek_nth(1), Some(d) if d.is_ascii_digit()) {
            self.advance();
            self.eat_digits();
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_digits_at = match self.peek_nth(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if matches!(self.peek_nth(exponent_digits_at), Some(d) if d.is_ascii_digit()) {
                for _ in 0..exponent_digits_at {
                    self.advance();
                }
                self.eat_digits();
            }
        }

        self.token(TokenKind::Number, start)
    }

    fn eat_digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Tokenize a quoted string: `"..."`. Strings do not span lines.
    fn tokenize_quoted_string(&mut self) -> Token<'src> {
        let start = self.location();

        // Consume opening quote
        self.advance();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    return self.token(TokenKind::Error, start);
                }
                Some('\r') if self.peek_nth(1) == Some('\n') => {
                    return self.token(TokenKind::Error, start);
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    // Escape sequence - consume backslash and next char
                    self.advance();
                    if matches!(self.peek(), Some(c) if c != '\n') {
                        self.advance();
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        self.token(TokenKind::QuotedString, start)
    }

    /// Tokenize a line comment: `# ...` or `// ...`.
    fn tokenize_comment(&mut self) -> Token<'src> {
        let start = self.location();
        self.skip_to_line_end();
        self.token(TokenKind::Comment, start)
    }

    fn skip_to_line_end(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' || self.starts_with("\r\n") {
                break;
            }
            self.advance();
        }
    }

    /// Tokenize a heredoc opener: `<<EOT` or `<<-EOT`.
    ///
    /// The rest of the opening line must be blank; the line break is part of
    /// the opener token.
    fn tokenize_heredoc_start(&mut self) -> Token<'src> {
        let start = self.location();

        let indented = self.remaining[2..].starts_with('-');
        let marker_len = if indented { 3 } else { 2 };
        let delimiter_len = ident_len(&self.remaining[marker_len..]);
        if delimiter_len == 0 {
            // `<<` without a terminator identifier is no heredoc
            self.advance();
            self.advance();
            return self.token(TokenKind::Unknown, start);
        }

        self.advance_by(marker_len);
        let rest = self.remaining;
        let delimiter = &rest[..delimiter_len];
        self.advance_by(delimiter_len);

        while let Some(' ' | '\t') = self.peek() {
            self.advance();
        }
        match self.line_break_len() {
            0 if !self.is_eof() => {
                self.skip_to_line_end();
                return self.token(TokenKind::Error, start);
            }
            n => self.advance_by(n),
        }

        self.heredoc_state = Some(HeredocState {
            delimiter,
            indented,
        });
        self.token(TokenKind::HeredocStart, start)
    }

    /// If the line starting `at` bytes into the remaining input is the
    /// terminator line, return the length of its indentation, identifier and
    /// trailing blanks.
    fn terminator_at(&self, at: usize, state: HeredocState<'src>) -> Option<usize> {
        let line = &self.remaining[at..];
        let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
        if indent > 0 && !state.indented {
            return None;
        }
        let after = line[indent..].strip_prefix(state.delimiter)?;
        let trailing = after.len() - after.trim_start_matches([' ', '\t']).len();
        let rest = &after[trailing..];
        if rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n") {
            Some(indent + state.delimiter.len() + trailing)
        } else {
            None
        }
    }

    fn end_heredoc(&mut self, len: usize, start: Position) -> Token<'src> {
        self.advance_by(len);
        self.heredoc_state = None;
        self.token(TokenKind::HeredocEnd, start)
    }

    /// Tokenize a heredoc body or its terminator.
    ///
    /// The body token stops right before the line break that precedes the
    /// terminator line; that line break belongs to the terminator token.
    fn tokenize_heredoc_body(&mut self, state: HeredocState<'src>) -> Token<'src> {
        let start = self.location();

        if self.is_eof() {
            self.heredoc_state = None;
            return self.token(TokenKind::Error, start);
        }

        // Terminator right after the opener: empty body.
        if let Some(len) = self.terminator_at(0, state) {
            return self.end_heredoc(len, start);
        }

        // Sitting on the line break before the terminator.
        let brk = self.line_break_len();
        if brk > 0
            && let Some(len) = self.terminator_at(brk, state)
        {
            return self.end_heredoc(brk + len, start);
        }

        loop {
            self.skip_to_line_end();

            let brk = self.line_break_len();
            if brk == 0 {
                // Hit EOF without a terminator. Clear the state so the next
                // call reports EOF instead of looping here forever.
                self.heredoc_state = None;
                return self.token(TokenKind::Error, start);
            }
            if self.terminator_at(brk, state).is_some() {
                break;
            }
            self.advance_by(brk);
        }

        self.token(TokenKind::HeredocContent, start)
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

/// Check if a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Byte length of the identifier at the start of `text` (0 if there is none).
fn ident_len(text: &str) -> usize {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if is_ident_start(c) => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !is_ident_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
