//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Container for the root elements of one parse
    DocumentFragment,
    /// Element node
    Element,
    /// Text content
    Text,
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for the fragment and for detached nodes)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Tag name for elements, character data for text nodes
    pub value: Box<str>,
    /// Attributes in assignment order (elements only)
    pub attributes: Vec<XmlAttribute>,
}

impl XmlNode {
    fn new(kind: NodeKind, value: &str) -> Self {
        XmlNode {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            value: value.into(),
            attributes: Vec::new(),
        }
    }

    /// Create the fragment node that holds root elements
    pub fn fragment() -> Self {
        Self::new(NodeKind::DocumentFragment, "")
    }

    /// Create a detached element node
    pub fn element(tag_name: &str) -> Self {
        Self::new(NodeKind::Element, tag_name)
    }

    /// Create a detached text node
    pub fn text(data: &str) -> Self {
        Self::new(NodeKind::Text, data)
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this is a text node
    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    /// Set an attribute, replacing the value of an existing one
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|attr| &*attr.name == name) {
            Some(attr) => attr.value = value.into(),
            None => self.attributes.push(XmlAttribute::new(name, value)),
        }
    }
}

/// Stored attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: Box<str>,
    pub value: Box<str>,
}

impl XmlAttribute {
    pub fn new(name: &str, value: &str) -> Self {
        XmlAttribute {
            name: name.into(),
            value: value.into(),
        }
    }
}
