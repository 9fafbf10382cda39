//! Read-only query views over a parsed [`Document`].
//!
//! A [`View`] wraps the document root or one node and answers lookups:
//!
//! - `get(name)` collects the direct children called `name`. Attributes
//!   resolve to their decoded value (several same-named attributes give a
//!   [`Value::List`] in source order). Blocks always come back as a
//!   [`BlockSet`], which can be narrowed further by label or position.
//! - `index(i)` returns the i-th child, or the i-th element of an array.
//! - `__name` and `__labels` are answered by every block, dictionary and
//!   attribute view (`__labels` by blocks only).
//!
//! Misses are `None`, never errors. Views never mutate the document, and
//! [`View::to_interchange`] exposes exactly the keys `get` can answer.

use std::borrow::Cow;

use ocl_parse::{Document, NodeId, NodeKind, NodeTag, Number, Scalar};
use serde_json::{Map, Value as Json};
use tracing::trace;

/// Synthetic key holding a node's own name.
pub const NAME_KEY: &str = "__name";

/// Synthetic key holding a block's decoded labels.
pub const LABELS_KEY: &str = "__labels";

/// Wrap the root of a document.
pub fn view(doc: &Document) -> View<'_> {
    View::root(doc)
}

/// What a [`View`] wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The top-level collection.
    Root,
    Node(NodeId),
}

/// A read-only view over the document root or one of its nodes.
#[derive(Clone, Copy)]
pub struct View<'doc> {
    doc: &'doc Document,
    target: Target,
}

/// The result of a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'doc> {
    String(Cow<'doc, str>),
    Number(Number),
    Bool(bool),
    /// Heredoc body, as written (dedented for `<<-`).
    Heredoc(&'doc str),
    /// An array value, duplicate attributes, or several label matches.
    List(Vec<Value<'doc>>),
    /// A dictionary, a single block picked by label or index, or any node
    /// reached by position.
    View(View<'doc>),
    /// All blocks sharing a name.
    Blocks(BlockSet<'doc>),
}

/// Same-named sibling blocks, in source order.
#[derive(Clone)]
pub struct BlockSet<'doc> {
    doc: &'doc Document,
    ids: Vec<NodeId>,
}

impl<'doc> View<'doc> {
    /// Wrap the root of `doc`.
    pub fn root(doc: &'doc Document) -> Self {
        Self {
            doc,
            target: Target::Root,
        }
    }

    /// Wrap a single node. `id` must come from `doc`.
    pub fn node(doc: &'doc Document, id: NodeId) -> Self {
        Self {
            doc,
            target: Target::Node(id),
        }
    }

    pub fn document(&self) -> &'doc Document {
        self.doc
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// The wrapped node, `None` for the root.
    pub fn id(&self) -> Option<NodeId> {
        match self.target {
            Target::Root => None,
            Target::Node(id) => Some(id),
        }
    }

    /// Tag of the wrapped node, `None` for the root.
    pub fn tag(&self) -> Option<NodeTag> {
        self.id().map(|id| self.doc.node(id).tag())
    }

    /// The node's own name. Dictionaries answer with the name of the
    /// attribute holding them.
    pub fn name(&self) -> Option<&'doc str> {
        self.id().and_then(|id| self.doc.node_name(id))
    }

    /// Decoded labels, for block views only.
    pub fn labels(&self) -> Option<Vec<String>> {
        self.id().and_then(|id| self.doc.labels(id))
    }

    /// Child node ids: top-level nodes for the root, the body of a block or
    /// dictionary, the elements of an array, or an attribute's value.
    pub fn children(&self) -> &'doc [NodeId] {
        match self.target {
            Target::Root => self.doc.roots(),
            Target::Node(id) => self.doc.children(id),
        }
    }

    /// Number of positions `index` can answer.
    pub fn len(&self) -> usize {
        match self.tag() {
            Some(NodeTag::Array) => self.elements().len(),
            Some(NodeTag::Attribute | NodeTag::Literal | NodeTag::Recovery) => 0,
            Some(NodeTag::Block | NodeTag::Dictionary) | None => self.children().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a key.
    pub fn get(&self, name: &str) -> Option<Value<'doc>> {
        let Target::Node(id) = self.target else {
            return lookup(self.doc, self.doc.roots(), name);
        };
        let node = self.doc.node(id);
        match &node.kind {
            NodeKind::Block(block) => match name {
                NAME_KEY => Some(Value::String(Cow::Borrowed(&block.name))),
                LABELS_KEY => Some(Value::List(
                    block
                        .labels()
                        .into_iter()
                        .map(|label| Value::String(Cow::Owned(label)))
                        .collect(),
                )),
                _ => lookup(self.doc, &block.children, name),
            },
            NodeKind::Dictionary(dict) => match name {
                NAME_KEY => self.name().map(|n| Value::String(Cow::Borrowed(n))),
                _ => lookup(self.doc, &dict.children, name),
            },
            NodeKind::Attribute(attr) => match name {
                NAME_KEY => Some(Value::String(Cow::Borrowed(&attr.name))),
                _ if name == attr.name => resolve(self.doc, attr.value),
                _ => None,
            },
            NodeKind::Array(_) | NodeKind::Literal(_) | NodeKind::Recovery => None,
        }
    }

    /// Positional lookup. Out-of-range positions are `None`.
    pub fn index(&self, index: usize) -> Option<Value<'doc>> {
        match self.tag() {
            Some(NodeTag::Array) => self.elements().into_iter().nth(index),
            Some(NodeTag::Block | NodeTag::Dictionary) | None => self
                .children()
                .get(index)
                .map(|id| Value::View(View::node(self.doc, *id))),
            Some(NodeTag::Attribute | NodeTag::Literal | NodeTag::Recovery) => None,
        }
    }

    /// Blocks called `name` whose last label is `label`.
    pub fn get_by_label(&self, name: &str, label: &str) -> Option<Value<'doc>> {
        match self.get(name)? {
            Value::Blocks(blocks) => blocks.label(label),
            _ => None,
        }
    }

    /// The keys `get` answers, in the order `to_interchange` emits them.
    /// Arrays answer with their positions.
    pub fn keys(&self) -> Vec<Cow<'doc, str>> {
        let Target::Node(id) = self.target else {
            return child_keys(self.doc, self.doc.roots(), &[])
                .into_iter()
                .map(Cow::Borrowed)
                .collect();
        };
        let borrowed = |names: Vec<&'doc str>| -> Vec<Cow<'doc, str>> {
            names.into_iter().map(Cow::Borrowed).collect()
        };
        match &self.doc.node(id).kind {
            NodeKind::Block(block) => {
                let shadowed = [NAME_KEY, LABELS_KEY];
                let mut keys = borrowed(child_keys(self.doc, &block.children, &shadowed));
                keys.push(Cow::Borrowed(NAME_KEY));
                keys.push(Cow::Borrowed(LABELS_KEY));
                keys
            }
            NodeKind::Dictionary(dict) => {
                let mut keys = borrowed(child_keys(self.doc, &dict.children, &[NAME_KEY]));
                if self.name().is_some() {
                    keys.push(Cow::Borrowed(NAME_KEY));
                }
                keys
            }
            NodeKind::Attribute(attr) => {
                if attr.name != NAME_KEY && resolve(self.doc, attr.value).is_some() {
                    vec![Cow::Borrowed(attr.name.as_str())]
                } else {
                    Vec::new()
                }
            }
            NodeKind::Array(_) => (0..self.len())
                .map(|i| Cow::Owned(i.to_string()))
                .collect(),
            NodeKind::Literal(_) | NodeKind::Recovery => Vec::new(),
        }
    }

    /// Convert to a plain JSON tree. Objects keep key order.
    pub fn to_interchange(&self) -> Json {
        if self.tag() == Some(NodeTag::Array) {
            return Json::Array(self.elements().iter().map(Value::to_interchange).collect());
        }
        let mut map = Map::new();
        for key in self.keys() {
            if let Some(value) = self.get(&key) {
                map.insert(key.into_owned(), value.to_interchange());
            }
        }
        Json::Object(map)
    }

    /// Resolved array elements; unsupported kinds are dropped.
    fn elements(&self) -> Vec<Value<'doc>> {
        match self.target {
            Target::Node(id) => match &self.doc.node(id).kind {
                NodeKind::Array(array) => array
                    .elements
                    .iter()
                    .filter_map(|el| resolve_element(self.doc, *el))
                    .collect(),
                _ => Vec::new(),
            },
            Target::Root => Vec::new(),
        }
    }
}

impl PartialEq for View<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.to_interchange() == other.to_interchange()
    }
}

impl std::fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("target", &self.target)
            .field("name", &self.name())
            .finish()
    }
}

impl<'doc> BlockSet<'doc> {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// The block at `index` in source order, ignoring labels.
    pub fn index(&self, index: usize) -> Option<View<'doc>> {
        self.ids.get(index).map(|id| View::node(self.doc, *id))
    }

    pub fn first(&self) -> Option<View<'doc>> {
        self.index(0)
    }

    /// Blocks whose last label is `label`: a single view for one match, a
    /// list of views for several.
    pub fn label(&self, label: &str) -> Option<Value<'doc>> {
        let mut matches: Vec<Value<'doc>> = self
            .iter()
            .filter(|view| {
                view.id()
                    .and_then(|id| self.doc.node(id).as_block())
                    .and_then(|block| block.last_label())
                    .is_some_and(|last| last == label)
            })
            .map(Value::View)
            .collect();
        trace!("Label {:?} matched {} blocks", label, matches.len());
        match matches.len() {
            0 => None,
            1 => matches.pop(),
            _ => Some(Value::List(matches)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = View<'doc>> + '_ {
        self.ids.iter().map(|id| View::node(self.doc, *id))
    }

    pub fn to_interchange(&self) -> Json {
        Json::Array(self.iter().map(|view| view.to_interchange()).collect())
    }
}

impl PartialEq for BlockSet<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.to_interchange() == other.to_interchange()
    }
}

impl std::fmt::Debug for BlockSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'doc> Value<'doc> {
    /// String or heredoc text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            Value::Heredoc(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value<'doc>]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// The wrapped view. A block set holding exactly one block collapses to
    /// that block.
    pub fn as_view(&self) -> Option<View<'doc>> {
        match self {
            Value::View(view) => Some(*view),
            Value::Blocks(blocks) if blocks.len() == 1 => blocks.first(),
            _ => None,
        }
    }

    pub fn as_blocks(&self) -> Option<&BlockSet<'doc>> {
        match self {
            Value::Blocks(blocks) => Some(blocks),
            _ => None,
        }
    }

    /// Look up a key on the wrapped view.
    pub fn get(&self, name: &str) -> Option<Value<'doc>> {
        self.as_view()?.get(name)
    }

    /// Positional lookup on lists, block sets and views.
    pub fn index(&self, index: usize) -> Option<Value<'doc>> {
        match self {
            Value::List(items) => items.get(index).cloned(),
            Value::Blocks(blocks) => blocks.index(index).map(Value::View),
            Value::View(view) => view.index(index),
            _ => None,
        }
    }

    /// Label dispatch on a block set.
    pub fn label(&self, label: &str) -> Option<Value<'doc>> {
        self.as_blocks()?.label(label)
    }

    pub fn to_interchange(&self) -> Json {
        match self {
            Value::String(s) => Json::String(s.to_string()),
            Value::Heredoc(s) => Json::String(s.to_string()),
            Value::Number(Number::Integer(n)) => Json::from(*n),
            // NaN and infinities have no JSON form.
            Value::Number(Number::Float(n)) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Bool(b) => Json::Bool(*b),
            Value::List(items) => Json::Array(items.iter().map(Value::to_interchange).collect()),
            Value::View(view) => view.to_interchange(),
            Value::Blocks(blocks) => blocks.to_interchange(),
        }
    }
}

impl<'doc> From<Scalar<'doc>> for Value<'doc> {
    fn from(scalar: Scalar<'doc>) -> Self {
        match scalar {
            Scalar::String(s) => Value::String(s),
            Scalar::Number(n) => Value::Number(n),
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Heredoc(s) => Value::Heredoc(s),
        }
    }
}

/// Resolve the children of one parent called `name`. The kind of the first
/// match decides whether attributes or blocks are collected.
fn lookup<'doc>(doc: &'doc Document, children: &[NodeId], name: &str) -> Option<Value<'doc>> {
    let mut matches = children
        .iter()
        .copied()
        .filter(|id| doc.node(*id).name() == Some(name))
        .peekable();
    let first = doc.node(*matches.peek()?).tag();
    let ids: Vec<NodeId> = matches.filter(|id| doc.node(*id).tag() == first).collect();
    trace!("Name {:?} matched {} {:?} nodes", name, ids.len(), first);

    if first == NodeTag::Block {
        return Some(Value::Blocks(BlockSet { doc, ids }));
    }

    let mut values: Vec<Value<'doc>> = ids
        .iter()
        .filter_map(|id| {
            let attr = doc.node(*id).as_attribute()?;
            resolve(doc, attr.value)
        })
        .collect();
    match values.len() {
        0 => None,
        1 => values.pop(),
        _ => Some(Value::List(values)),
    }
}

/// Deduplicated names `lookup` can answer, in first-occurrence order.
/// Names in `shadowed` are answered by the view itself, not by a child.
fn child_keys<'doc>(
    doc: &'doc Document,
    children: &[NodeId],
    shadowed: &[&str],
) -> Vec<&'doc str> {
    let mut keys: Vec<&'doc str> = Vec::new();
    for id in children {
        let Some(name) = doc.node(*id).name() else {
            continue;
        };
        if shadowed.contains(&name) {
            continue;
        }
        if keys.contains(&name) {
            continue;
        }
        if lookup(doc, children, name).is_some() {
            keys.push(name);
        }
    }
    keys
}

/// The value an attribute holds.
fn resolve(doc: &Document, id: NodeId) -> Option<Value<'_>> {
    match &doc.node(id).kind {
        NodeKind::Literal(literal) => Some(literal.decode().into()),
        NodeKind::Dictionary(_) => Some(Value::View(View::node(doc, id))),
        NodeKind::Array(array) => Some(Value::List(
            array
                .elements
                .iter()
                .filter_map(|el| resolve_element(doc, *el))
                .collect(),
        )),
        NodeKind::Block(_) | NodeKind::Attribute(_) | NodeKind::Recovery => None,
    }
}

/// Array elements resolve to scalars or dictionary views only.
fn resolve_element(doc: &Document, id: NodeId) -> Option<Value<'_>> {
    match &doc.node(id).kind {
        NodeKind::Literal(literal) => Some(literal.decode().into()),
        NodeKind::Dictionary(_) => Some(Value::View(View::node(doc, id))),
        _ => None,
    }
}
