//! DOM Node

use crate::{DOMTokenList, NodeId};

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (None for the document root)
    pub parent: Option<NodeId>,
    /// Children in document order
    pub children: Vec<NodeId>,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data: NodeData::Element(ElementData::new(tag)),
        }
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data: NodeData::Text(content),
        }
    }

    /// Create a document node
    pub fn document() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data: NodeData::Document,
        }
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text_mut(&mut self) -> Option<&mut String> {
        match &mut self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
}

/// Element-specific data
#[derive(Debug, Default)]
pub struct ElementData {
    /// Lowercased tag name
    pub tag: String,
    /// Attributes other than `class`, in insertion order
    pub attrs: Vec<(String, String)>,
    /// Class list (the `class` attribute)
    pub classes: DOMTokenList,
    /// Inline style declarations, in insertion order
    pub style: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// Get an attribute value. `class` reads through the class list.
    pub fn get_attr(&self, name: &str) -> Option<String> {
        if name == "class" {
            return (!self.classes.is_empty()).then(|| self.classes.value());
        }
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Set an attribute value. `class` replaces the class list.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if name == "class" {
            self.classes = DOMTokenList::from_string(value);
            return;
        }
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> bool {
        if name == "class" {
            let had = !self.classes.is_empty();
            self.classes = DOMTokenList::new();
            return had;
        }
        let before = self.attrs.len();
        self.attrs.retain(|(n, _)| n != name);
        before != self.attrs.len()
    }

    pub fn has_attr(&self, name: &str) -> bool {
        if name == "class" {
            return !self.classes.is_empty();
        }
        self.attrs.iter().any(|(n, _)| n == name)
    }

    /// The `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == "id")
            .map(|(_, v)| v.as_str())
    }

    pub fn style_property(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_style_property(&mut self, property: &str, value: &str) {
        match self.style.iter_mut().find(|(p, _)| p == property) {
            Some((_, v)) => *v = value.to_string(),
            None => self.style.push((property.to_string(), value.to_string())),
        }
    }
}
