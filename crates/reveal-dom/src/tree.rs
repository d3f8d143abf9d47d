//! DOM Tree (arena-based allocation)

use crate::{Node, NodeId};

/// Arena-based DOM tree. Node 0 is always the document node.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
        }
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the document node is never removed
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Allocate a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Allocate a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content.to_string()))
    }

    /// Append `child` as the last child of `parent`, detaching it from
    /// any previous parent. Appending a node under itself is ignored.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.get(parent).is_none() || self.get(child).is_none() {
            return;
        }
        if self.ancestors(parent).any(|a| a == child) {
            tracing::warn!("refusing to append {} under its own descendant {}", child, parent);
            return;
        }
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Remove a node from its parent; the node stays allocated.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.get(id).and_then(|n| n.parent) else {
            return;
        };
        self.nodes[parent.index()].children.retain(|&c| c != id);
        self.nodes[id.index()].parent = None;
    }

    /// Direct children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Ancestors from the parent up to the document node
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// Descendants of `id` in document (pre-)order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_descendants_in_document_order() {
        let mut tree = DomTree::new();
        let body = tree.create_element("body");
        let a = tree.create_element("section");
        let a1 = tree.create_element("p");
        let b = tree.create_element("section");

        tree.append_child(tree.root(), body);
        tree.append_child(body, a);
        tree.append_child(a, a1);
        tree.append_child(body, b);

        assert_eq!(tree.descendants(tree.root()), vec![body, a, a1, b]);
        assert_eq!(tree.ancestors(a1).collect::<Vec<_>>(), vec![a, body, NodeId::ROOT]);
    }

    #[test]
    fn test_reparenting_and_cycles() {
        let mut tree = DomTree::new();
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        tree.append_child(tree.root(), a);
        tree.append_child(a, b);

        // a under its own child is refused
        tree.append_child(b, a);
        assert_eq!(tree.parent(a), Some(NodeId::ROOT));
        assert_eq!(tree.children(a), &[b]);

        // b under root moves it out of a
        tree.append_child(tree.root(), b);
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.parent(b), Some(NodeId::ROOT));
    }
}
