//! reveal DOM - Document Object Model
//!
//! Arena-based DOM with the surface page scripts actually touch:
//! class lists, attributes, inline styles, text, selector queries
//! and per-node layout geometry.

mod classlist;
mod document;
mod geometry;
mod node;
mod selector;
mod tree;

pub use classlist::DOMTokenList;
pub use document::Document;
pub use geometry::{DOMRect, Viewport};
pub use node::{ElementData, Node, NodeData};
pub use selector::{AttrMatcher, Combinator, Compound, SelectorError, SelectorList};
pub use tree::DomTree;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Build an id from its raw arena index.
    pub const fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
