//! Document - High-level document API
//!
//! Wraps the tree with the query, mutation and geometry calls page
//! scripts make. Anything that is not an element is silently ignored
//! by the mutators, mirroring `element?.classList.add(..)` guards.

use std::collections::HashMap;

use crate::{DOMRect, DOMTokenList, DomTree, ElementData, NodeId, SelectorError, SelectorList, Viewport};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
    /// Border boxes in document coordinates, filled in by layout
    layout: HashMap<NodeId, DOMRect>,
    viewport: Viewport,
}

impl Document {
    /// Create a new document with `<html><head/><body/></html>`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        tree.append_child(tree.root(), html);
        tree.append_child(html, head);
        tree.append_child(html, body);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
            layout: HashMap::new(),
            viewport: Viewport::default(),
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Create an element and append it to `parent`.
    /// `classes` is a space-separated class attribute.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, classes: &str) -> NodeId {
        let id = self.tree.create_element(tag);
        if let Some(elem) = self.element_mut(id) {
            elem.classes = DOMTokenList::from_string(classes);
        }
        self.tree.append_child(parent, id);
        id
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        self.tree.get(node).and_then(|n| n.as_element())
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        self.tree.get_mut(node).and_then(|n| n.as_element_mut())
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|&n| self.element(n).and_then(|e| e.id()) == Some(id))
    }

    /// All elements under `scope` (the whole document when `None`)
    /// matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str, scope: Option<NodeId>) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.select_all(&list, scope))
    }

    /// First element matching `selector`, if any
    pub fn query_selector(&self, selector: &str, scope: Option<NodeId>) -> Result<Option<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        let scope = scope.unwrap_or(self.tree.root());
        Ok(self
            .tree
            .descendants(scope)
            .into_iter()
            .find(|&n| list.matches(&self.tree, n)))
    }

    /// Run an already parsed selector list
    pub fn select_all(&self, list: &SelectorList, scope: Option<NodeId>) -> Vec<NodeId> {
        let scope = scope.unwrap_or(self.tree.root());
        let found: Vec<NodeId> = self
            .tree
            .descendants(scope)
            .into_iter()
            .filter(|&n| list.matches(&self.tree, n))
            .collect();
        tracing::trace!("selector matched {} node(s) under {}", found.len(), scope);
        found
    }

    pub fn class_list(&self, node: NodeId) -> Option<&DOMTokenList> {
        self.element(node).map(|e| &e.classes)
    }

    pub fn class_list_mut(&mut self, node: NodeId) -> Option<&mut DOMTokenList> {
        self.element_mut(node).map(|e| &mut e.classes)
    }

    /// Convenience for `class_list(node).contains(class)`
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.class_list(node).is_some_and(|c| c.contains(class))
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node).and_then(|e| e.get_attr(name))
    }

    /// Returns false when `node` is not an element
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        match self.element_mut(node) {
            Some(e) => {
                e.set_attr(name, value);
                true
            }
            None => false,
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> bool {
        self.element_mut(node).is_some_and(|e| e.remove_attr(name))
    }

    /// Inline style property
    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node).and_then(|e| e.style_property(property))
    }

    /// Set an inline style property. Returns false when `node` is not an element.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> bool {
        match self.element_mut(node) {
            Some(e) => {
                e.set_style_property(property, value);
                true
            }
            None => false,
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, node: NodeId) -> String {
        if let Some(text) = self.tree.get(node).and_then(|n| n.as_text()) {
            return text.to_string();
        }
        self.tree
            .descendants(node)
            .into_iter()
            .filter_map(|n| self.tree.get(n).and_then(|n| n.as_text()))
            .collect()
    }

    /// Replace all children of `node` with a single text node.
    /// A lone existing text child is rewritten in place.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        if self.element(node).is_none() {
            return;
        }
        if let &[only] = self.tree.children(node) {
            if let Some(content) = self.tree.get_mut(only).and_then(|n| n.as_text_mut()) {
                content.clear();
                content.push_str(text);
                return;
            }
        }
        for child in self.tree.children(node).to_vec() {
            self.tree.detach(child);
        }
        let text = self.tree.create_text(text);
        self.tree.append_child(node, text);
    }

    /// Record the laid-out box of a node and grow the scrollable area to fit
    pub fn set_layout(&mut self, node: NodeId, rect: DOMRect) {
        self.viewport.scroll_height = self.viewport.scroll_height.max(rect.bottom());
        self.viewport.scroll_width = self.viewport.scroll_width.max(rect.right());
        self.layout.insert(node, rect);
    }

    /// Laid-out box in document coordinates
    pub fn layout(&self, node: NodeId) -> Option<DOMRect> {
        self.layout.get(&node).copied()
    }

    /// Box relative to the viewport, like `getBoundingClientRect`
    pub fn bounding_client_rect(&self, node: NodeId) -> Option<DOMRect> {
        self.layout(node).map(|r| {
            DOMRect::from_xywh(
                r.x - self.viewport.scroll_x,
                r.y - self.viewport.scroll_y,
                r.width,
                r.height,
            )
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Vertical scroll, clamped to the content
    pub fn scroll_to(&mut self, y: f64) {
        let x = self.viewport.scroll_x;
        self.viewport.scroll_to(x, y);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brochure() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new("https://example.com/");
        let body = doc.body();
        let services = doc.append_element(body, "section", "services");
        let card_a = doc.append_element(services, "div", "service-card");
        let card_b = doc.append_element(services, "div", "service-card featured");
        let quote = doc.append_element(body, "blockquote", "testimonial");
        let img = doc.append_element(body, "img", "");
        doc.set_attribute(img, "data-src", "img/hero.jpg");
        doc.set_attribute(services, "id", "services");
        (doc, vec![services, card_a, card_b, quote, img])
    }

    #[test]
    fn test_query_selector_all_document_order() {
        let (doc, n) = brochure();
        let found = doc
            .query_selector_all(".testimonial, .service-card", None)
            .unwrap();
        assert_eq!(found, vec![n[1], n[2], n[3]]);
    }

    #[test]
    fn test_query_with_scope_and_combinators() {
        let (doc, n) = brochure();
        assert_eq!(doc.query_selector_all("div", Some(n[0])).unwrap(), vec![n[1], n[2]]);
        assert_eq!(doc.query_selector_all("#services > .featured", None).unwrap(), vec![n[2]]);
        assert_eq!(doc.query_selector_all("body img[data-src]", None).unwrap(), vec![n[4]]);
        assert!(doc.query_selector_all("html > div", None).unwrap().is_empty());
        assert_eq!(doc.query_selector(".service-card", None).unwrap(), Some(n[1]));
        assert!(doc.query_selector_all("::", None).is_err());
    }

    #[test]
    fn test_mutators_ignore_non_elements() {
        let (mut doc, n) = brochure();
        let text = doc.tree.create_text("hi");
        assert!(!doc.set_style(text, "opacity", "1"));
        assert!(!doc.set_attribute(text, "src", "x"));
        assert!(doc.class_list_mut(text).is_none());

        assert!(doc.set_style(n[1], "opacity", "0"));
        assert_eq!(doc.style(n[1], "opacity"), Some("0"));
        assert_eq!(doc.get_element_by_id("services"), Some(n[0]));
    }

    #[test]
    fn test_text_content_roundtrip() {
        let (mut doc, n) = brochure();
        doc.set_text_content(n[1], "0");
        doc.set_text_content(n[1], "49");
        assert_eq!(doc.text_content(n[1]), "49");
        assert_eq!(doc.tree.children(n[1]).len(), 1);
    }

    #[test]
    fn test_set_text_content_reuses_text_node() {
        let (mut doc, n) = brochure();
        doc.set_text_content(n[2], "0");
        let nodes = doc.tree.len();
        let text = doc.tree.children(n[2])[0];

        for i in 1..=100 {
            doc.set_text_content(n[2], &i.to_string());
        }
        assert_eq!(doc.tree.len(), nodes);
        assert_eq!(doc.tree.children(n[2]), &[text]);
        assert_eq!(doc.text_content(n[2]), "100");

        // element children are still replaced wholesale
        let inner = doc.append_element(n[2], "span", "");
        doc.set_text_content(n[2], "x");
        assert_eq!(doc.tree.parent(inner), None);
        assert_eq!(doc.text_content(n[2]), "x");
    }

    #[test]
    fn test_layout_and_client_rect() {
        let (mut doc, n) = brochure();
        doc.viewport_mut().height = 600.0;
        doc.set_layout(n[3], DOMRect::from_xywh(0.0, 1500.0, 800.0, 300.0));
        assert_eq!(doc.viewport().scroll_height, 1800.0);

        doc.scroll_to(1000.0);
        assert_eq!(
            doc.bounding_client_rect(n[3]),
            Some(DOMRect::from_xywh(0.0, 500.0, 800.0, 300.0))
        );
        assert!(doc.bounding_client_rect(n[1]).is_none());
    }
}
