//! Recursive-descent parser building a [`Document`].
//!
//! ```text
//! Document    := (Block | Attribute)*
//! Block       := IDENT STRING* '{' (Block | Attribute)* '}'
//! Attribute   := (IDENT | STRING) '=' Value
//! Value       := Literal | Array | Dictionary
//! Dictionary  := '{' (Block | Attribute)* '}'
//! Array       := '[' (Value (','? Value)*)? ','? ']'
//! Literal     := STRING | NUMBER | BOOLEAN | HEREDOC
//! ```
//!
//! Anything that does not fit becomes a `Recovery` node and parsing carries
//! on; only lexical errors abort.

use ocl_tokenizer::{Span, Token, TokenKind};
use tracing::debug;

use crate::ast::{
    Array, Attribute, Block, Dictionary, Document, Literal, LiteralKind, NodeId, NodeKind,
};
use crate::error::LexError;
use crate::escape::decode_quoted;
use crate::lexer::Lexer;

/// Default limit on nested blocks, dictionaries and arrays.
///
/// Parsing recurses once per level, so the limit keeps deep input from
/// exhausting the stack. Deeper constructs become `Recovery` nodes.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Parser for OCL documents.
#[derive(Debug, Clone)]
pub struct Parser<'src> {
    source: &'src str,
    max_depth: usize,
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse the whole input.
    pub fn parse(self) -> Result<Document, LexError> {
        let tokens = Lexer::new(self.source).tokenize()?;
        let mut state = ParseState {
            source: self.source,
            tokens,
            cursor: 0,
            doc: Document::default(),
            depth: 0,
            max_depth: self.max_depth,
        };
        let roots = state.parse_body(None, false);
        state.doc.set_roots(roots);
        Ok(state.doc)
    }
}

/// What an entry position starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryStart {
    Block,
    Attribute,
}

struct ParseState<'src> {
    source: &'src str,
    /// Significant tokens, always ending with `Eof`.
    tokens: Vec<Token<'src>>,
    cursor: usize,
    doc: Document,
    depth: usize,
    max_depth: usize,
}

impl<'src> ParseState<'src> {
    #[inline]
    fn peek(&self) -> &Token<'src> {
        &self.tokens[self.cursor]
    }

    #[inline]
    fn kind_at(&self, index: usize) -> TokenKind {
        self.tokens
            .get(index)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// Consume the next token. `Eof` is never consumed.
    fn advance(&mut self) -> Token<'src> {
        let token = self.tokens[self.cursor].clone();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    /// End offset of the last consumed token.
    fn prev_end(&self) -> u32 {
        self.cursor
            .checked_sub(1)
            .map(|i| self.tokens[i].span.end)
            .unwrap_or(0)
    }

    /// Classify the entry starting at token `at`, if any.
    fn entry_at(&self, at: usize) -> Option<EntryStart> {
        match self.kind_at(at) {
            TokenKind::Ident => {}
            TokenKind::QuotedString => {
                return (self.kind_at(at + 1) == TokenKind::Equals)
                    .then_some(EntryStart::Attribute);
            }
            _ => return None,
        }
        if self.kind_at(at + 1) == TokenKind::Equals {
            return Some(EntryStart::Attribute);
        }
        let mut i = at + 1;
        while self.kind_at(i) == TokenKind::QuotedString {
            i += 1;
        }
        (self.kind_at(i) == TokenKind::LBrace).then_some(EntryStart::Block)
    }

    /// Parse entries until end of input, or until the closing `}` when
    /// `nested` (the brace is left for the caller).
    fn parse_body(&mut self, parent: Option<NodeId>, nested: bool) -> Vec<NodeId> {
        let mut children = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::RBrace if nested => break,
                _ => {}
            }
            let child = match self.entry_at(self.cursor) {
                Some(EntryStart::Attribute) => self.parse_attribute(parent, nested),
                Some(EntryStart::Block) => self.parse_block(parent),
                None => self.recover(parent, nested),
            };
            children.push(child);
        }
        children
    }

    /// Skip one token, or a whole bracketed group when it opens one.
    /// Returns the end offset of what was skipped.
    fn skip_one(&mut self) -> u32 {
        let first = self.advance();
        if !matches!(first.kind, TokenKind::LBrace | TokenKind::LBracket) {
            return first.span.end;
        }
        let mut depth = 1usize;
        let mut end = first.span.end;
        while depth > 0 && self.peek().kind != TokenKind::Eof {
            let token = self.advance();
            match token.kind {
                TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace | TokenKind::RBracket => depth -= 1,
                _ => {}
            }
            end = token.span.end;
        }
        end
    }

    /// Produce a `Recovery` node for unparseable input at an entry position.
    fn recover(&mut self, parent: Option<NodeId>, nested: bool) -> NodeId {
        let start = self.peek().span.start;
        let end = self.skip_one();
        self.recover_from(start, end, parent, nested)
    }

    /// Extend a recovery span until an entry start, the enclosing `}`, or
    /// end of input.
    fn recover_from(
        &mut self,
        start: u32,
        mut end: u32,
        parent: Option<NodeId>,
        nested: bool,
    ) -> NodeId {
        loop {
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::RBrace if nested => break,
                _ if self.entry_at(self.cursor).is_some() => break,
                _ => end = self.skip_one(),
            }
        }
        let span = Span::new(start, end);
        debug!(
            "Recovering from unparseable input at {}..{}: {:?}",
            span.start,
            span.end,
            span.slice(self.source)
        );
        self.doc.push(NodeKind::Recovery, parent, span)
    }

    /// Whether another container level fits under the nesting limit.
    fn can_nest(&self) -> bool {
        self.depth < self.max_depth
    }

    /// Skip a container that is nested too deeply, recording it as recovery.
    fn skip_too_deep(&mut self, start: u32, parent: Option<NodeId>) -> NodeId {
        let end = self.skip_one();
        debug!(
            "Nesting deeper than {} levels at offset {}, skipping",
            self.max_depth, start
        );
        self.doc
            .push(NodeKind::Recovery, parent, Span::new(start, end))
    }

    /// Consume the closing token, tolerating its absence.
    fn close(&mut self, expected: TokenKind, what: &str, opened_at: u32) -> u32 {
        if self.peek().kind == expected {
            return self.advance().span.end;
        }
        debug!("Unclosed {} opened at offset {}", what, opened_at);
        self.prev_end()
    }

    fn parse_attribute(&mut self, parent: Option<NodeId>, nested: bool) -> NodeId {
        let name_token = self.advance();
        let name = match name_token.kind {
            TokenKind::QuotedString => decode_quoted(name_token.text).into_owned(),
            _ => name_token.text.to_string(),
        };
        let equals = self.advance();

        if !self.peek().kind.is_value_start() {
            return self.recover_from(name_token.span.start, equals.span.end, parent, nested);
        }

        // Reserve the slot first so the value can point back at it.
        let id = self.doc.push(NodeKind::Recovery, parent, name_token.span);
        let value = self.parse_value(id);
        let end = self.doc.node(value).span.end;

        let node = self.doc.node_mut(id);
        node.kind = NodeKind::Attribute(Attribute { name, value });
        node.span = Span::new(name_token.span.start, end);
        id
    }

    fn parse_block(&mut self, parent: Option<NodeId>) -> NodeId {
        let name_token = self.advance();
        let mut raw_labels = Vec::new();
        while self.peek().kind == TokenKind::QuotedString {
            raw_labels.push(self.advance().text.to_string());
        }

        let start = name_token.span.start;
        if !self.can_nest() {
            return self.skip_too_deep(start, parent);
        }

        let open = self.advance();
        let id = self.doc.push(NodeKind::Recovery, parent, name_token.span);
        self.depth += 1;
        let children = self.parse_body(Some(id), true);
        self.depth -= 1;
        let end = self.close(TokenKind::RBrace, "block", open.span.start);

        let node = self.doc.node_mut(id);
        node.kind = NodeKind::Block(Block {
            name: name_token.text.to_string(),
            raw_labels,
            children,
        });
        node.span = Span::new(start, end);
        id
    }

    /// Parse a value. The current token must satisfy `is_value_start`.
    fn parse_value(&mut self, parent: NodeId) -> NodeId {
        let token = self.peek().clone();
        let literal = |kind| {
            NodeKind::Literal(Literal {
                kind,
                raw: token.text.to_string(),
            })
        };
        match token.kind {
            TokenKind::QuotedString => {
                self.advance();
                self.doc
                    .push(literal(LiteralKind::String), Some(parent), token.span)
            }
            TokenKind::Number => {
                self.advance();
                self.doc
                    .push(literal(LiteralKind::Number), Some(parent), token.span)
            }
            TokenKind::Bool => {
                self.advance();
                self.doc
                    .push(literal(LiteralKind::Bool), Some(parent), token.span)
            }
            TokenKind::HeredocStart => self.parse_heredoc(parent),
            TokenKind::LBrace => self.parse_dictionary(parent),
            TokenKind::LBracket => self.parse_array(parent),
            _ => {
                let end = self.skip_one();
                self.doc.push(
                    NodeKind::Recovery,
                    Some(parent),
                    Span::new(token.span.start, end),
                )
            }
        }
    }

    fn parse_heredoc(&mut self, parent: NodeId) -> NodeId {
        let start = self.advance();
        let indented = start.text.starts_with("<<-");

        let body = if self.peek().kind == TokenKind::HeredocContent {
            self.advance().text
        } else {
            ""
        };

        let mut span = start.span;
        let mut indent = 0;
        if self.peek().kind == TokenKind::HeredocEnd {
            let end = self.advance();
            indent = terminator_indent(end.text);
            span = span.cover(end.span);
        }

        let literal = if indented {
            Literal {
                kind: LiteralKind::IndentedHeredoc,
                raw: dedent(body, indent),
            }
        } else {
            Literal {
                kind: LiteralKind::Heredoc,
                raw: body.to_string(),
            }
        };
        self.doc
            .push(NodeKind::Literal(literal), Some(parent), span)
    }

    fn parse_dictionary(&mut self, parent: NodeId) -> NodeId {
        let start = self.peek().span.start;
        if !self.can_nest() {
            return self.skip_too_deep(start, Some(parent));
        }

        self.advance();
        let id = self
            .doc
            .push(NodeKind::Recovery, Some(parent), Span::empty(start));
        self.depth += 1;
        let children = self.parse_body(Some(id), true);
        self.depth -= 1;
        let end = self.close(TokenKind::RBrace, "dictionary", start);

        let node = self.doc.node_mut(id);
        node.kind = NodeKind::Dictionary(Dictionary { children });
        node.span = Span::new(start, end);
        id
    }

    fn parse_array(&mut self, parent: NodeId) -> NodeId {
        let start = self.peek().span.start;
        if !self.can_nest() {
            return self.skip_too_deep(start, Some(parent));
        }

        self.advance();
        let id = self
            .doc
            .push(NodeKind::Recovery, Some(parent), Span::empty(start));
        self.depth += 1;
        let mut elements = Vec::new();
        loop {
            let kind = self.peek().kind;
            match kind {
                // `}` belongs to an enclosing body; leave it there.
                TokenKind::RBracket | TokenKind::RBrace | TokenKind::Eof => break,
                TokenKind::Comma => {
                    self.advance();
                }
                _ if kind.is_value_start() => elements.push(self.parse_value(id)),
                _ => {
                    let element_start = self.peek().span.start;
                    let end = self.skip_one();
                    let span = Span::new(element_start, end);
                    debug!(
                        "Skipping non-value array element {:?}",
                        span.slice(self.source)
                    );
                    elements.push(self.doc.push(NodeKind::Recovery, Some(id), span));
                }
            }
        }
        self.depth -= 1;
        let end = self.close(TokenKind::RBracket, "array", start);

        let node = self.doc.node_mut(id);
        node.kind = NodeKind::Array(Array { elements });
        node.span = Span::new(start, end);
        id
    }
}

/// Indentation of a heredoc terminator token (which starts with the line
/// break before the terminator line, when there is a body).
fn terminator_indent(text: &str) -> usize {
    let line = text.trim_start_matches(['\r', '\n']);
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Strip up to `indent` leading spaces/tabs from every line.
fn dedent(body: &str, indent: usize) -> String {
    if indent == 0 {
        return body.to_string();
    }
    body.split('\n')
        .map(|line| {
            let ws = line.len() - line.trim_start_matches([' ', '\t']).len();
            &line[ws.min(indent)..]
        })
        .collect::<Vec<_>>()
        .join("\n")
}
