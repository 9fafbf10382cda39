//! Query views for OCL documents.
//!
//! ```text
//! step "deploy" {
//!   name = "Deploy web"
//!   properties = { Octopus.Action.RunOnServer = "true" }
//! }
//! ```
//!
//! `view(&doc).get_by_label("step", "deploy")` finds the block, `.get("name")`
//! reads the attribute, and `.get("properties")` returns a nested view over
//! the dictionary. Every view converts to a JSON tree with
//! [`View::to_interchange`].

mod diagnostic;
mod view;

pub use diagnostic::ParseError;
pub use ocl_parse::{
    Document, LexError, LexErrorKind, NodeId, NodeKind, NodeTag, Number, Parser, Position,
    Scalar, Span,
};
pub use view::{BlockSet, LABELS_KEY, NAME_KEY, Target, Value, View, view};

/// Parse an OCL document.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    Ok(ocl_parse::parse(source)?)
}

/// Parse with a custom nesting limit.
pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Document, ParseError> {
    Ok(Parser::new(source).with_max_depth(max_depth).parse()?)
}
