//! The OCL document tree.
//!
//! Every node lives in one arena owned by [`Document`] and is addressed by a
//! [`NodeId`]. Parents own their children through id lists; the `parent`
//! field on a node is a plain back-reference.
//!
//! ```text
//! step "deploy" {          Block { name: "step", labels: ["deploy"] }
//!   retries = 3            Attribute -> Literal(Number)
//!   env = { region = "x" } Attribute -> Dictionary -> Attribute -> Literal
//!   roles = ["web", "db"]  Attribute -> Array -> [Literal, Literal]
//! }
//! ```

use std::borrow::Cow;

use ocl_tokenizer::Span;

use crate::error::LexError;
use crate::escape::decode_quoted;

/// Index of a node in its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A parsed OCL document: the node arena plus the top-level nodes in source
/// order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Document {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Node {
    pub kind: NodeKind,
    /// The enclosing node, `None` for top-level nodes.
    pub parent: Option<NodeId>,
    /// Source range covered by the node.
    pub span: Span,
}

/// The node variants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum NodeKind {
    /// `name "label" ... { ... }`
    Block(Block),
    /// `name = value`
    Attribute(Attribute),
    /// `{ ... }` in value position.
    Dictionary(Dictionary),
    /// `[ ... ]`
    Array(Array),
    /// A scalar or heredoc.
    Literal(Literal),
    /// Input that matched nothing in the grammar.
    Recovery,
}

/// Variant tag of a [`NodeKind`], for dispatch without borrowing the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Block,
    Attribute,
    Dictionary,
    Array,
    Literal,
    Recovery,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Block {
    pub name: String,
    /// Labels as written, quotes and escapes included. See [`Block::labels`].
    pub raw_labels: Vec<String>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Attribute {
    pub name: String,
    pub value: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Dictionary {
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Array {
    pub elements: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Literal {
    pub kind: LiteralKind,
    /// Token text for strings, numbers and booleans; the body for heredocs
    /// (already dedented for the indented form).
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum LiteralKind {
    String,
    Number,
    Bool,
    /// `<<EOT`
    Heredoc,
    /// `<<-EOT`
    IndentedHeredoc,
}

/// A decoded literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar<'a> {
    String(Cow<'a, str>),
    Number(Number),
    Bool(bool),
    /// Heredoc body, never unescaped.
    Heredoc(&'a str),
}

/// A decoded number: integers stay integers when they fit in an `i64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// Parse number token text.
    pub fn parse(text: &str) -> Number {
        match text.parse::<i64>() {
            Ok(n) => Number::Integer(n),
            Err(_) => Number::Float(text.parse::<f64>().unwrap_or(f64::NAN)),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    /// The integer value, if this number has no fractional part.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::Integer(n) => Some(n),
            Number::Float(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Some(n as i64),
            Number::Float(_) => None,
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{}", n),
            Number::Float(n) => write!(f, "{}", n),
        }
    }
}

impl Literal {
    /// Decode into a native scalar. Heredoc bodies come back untouched.
    pub fn decode(&self) -> Scalar<'_> {
        match self.kind {
            LiteralKind::String => Scalar::String(decode_quoted(&self.raw)),
            LiteralKind::Number => Scalar::Number(Number::parse(&self.raw)),
            LiteralKind::Bool => Scalar::Bool(self.raw == "true"),
            LiteralKind::Heredoc | LiteralKind::IndentedHeredoc => Scalar::Heredoc(&self.raw),
        }
    }
}

impl Block {
    /// Decoded labels, in source order.
    pub fn labels(&self) -> Vec<String> {
        self.raw_labels
            .iter()
            .map(|raw| decode_quoted(raw).into_owned())
            .collect()
    }

    /// The decoded last label, which is what label lookups match against.
    pub fn last_label(&self) -> Option<Cow<'_, str>> {
        self.raw_labels.last().map(|raw| decode_quoted(raw))
    }
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::Block(_) => NodeTag::Block,
            NodeKind::Attribute(_) => NodeTag::Attribute,
            NodeKind::Dictionary(_) => NodeTag::Dictionary,
            NodeKind::Array(_) => NodeTag::Array,
            NodeKind::Literal(_) => NodeTag::Literal,
            NodeKind::Recovery => NodeTag::Recovery,
        }
    }
}

impl Node {
    #[inline]
    pub fn tag(&self) -> NodeTag {
        self.kind.tag()
    }

    /// The node's own name: set for blocks and attributes only.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Block(block) => Some(&block.name),
            NodeKind::Attribute(attr) => Some(&attr.name),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match &self.kind {
            NodeKind::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&Attribute> {
        match &self.kind {
            NodeKind::Attribute(attr) => Some(attr),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            NodeKind::Literal(literal) => Some(literal),
            _ => None,
        }
    }
}

impl Document {
    /// Parse an OCL document.
    pub fn parse(source: &str) -> Result<Self, LexError> {
        crate::Parser::new(source).parse()
    }

    pub(crate) fn push(&mut self, kind: NodeKind, parent: Option<NodeId>, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, parent, span });
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn set_roots(&mut self, roots: Vec<NodeId>) {
        self.roots = roots;
    }

    /// Top-level nodes, in source order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Whether the document has no top-level nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a node. Panics if `id` belongs to another document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Iterate over every node in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Direct children: block and dictionary bodies, array elements, or an
    /// attribute's value.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            NodeKind::Block(block) => &block.children,
            NodeKind::Dictionary(dict) => &dict.children,
            NodeKind::Array(array) => &array.elements,
            NodeKind::Attribute(attr) => std::slice::from_ref(&attr.value),
            NodeKind::Literal(_) | NodeKind::Recovery => &[],
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// An attribute at the top level of the document.
    pub fn is_floating(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.tag() == NodeTag::Attribute && node.parent.is_none()
    }

    /// The name a node answers to. Dictionaries inherit the name of the
    /// attribute holding them, also through an enclosing array.
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.node(id);
        if node.tag() != NodeTag::Dictionary {
            return node.name();
        }
        let mut current = node.parent;
        while let Some(parent) = current {
            let parent_node = self.node(parent);
            match &parent_node.kind {
                NodeKind::Attribute(attr) => return Some(&attr.name),
                NodeKind::Array(_) => current = parent_node.parent,
                _ => return None,
            }
        }
        None
    }

    /// Decoded labels of a block node; `None` for anything else.
    pub fn labels(&self, id: NodeId) -> Option<Vec<String>> {
        self.node(id).as_block().map(Block::labels)
    }
}
