//! XML Document - Arena-based DOM representation
//!
//! Nodes live in one Vec and refer to each other by NodeId. Node 0 is the
//! fragment that holds the root elements once a parse succeeds.

use super::node::{NodeId, XmlAttribute, XmlNode};
use super::DocumentFactory;
use crate::core::error::{DocumentError, SyntaxError};
use crate::core::parser::{DoctypeInfo, Parser};
use crate::options::ParseOptions;

/// NodeId of the fragment node
pub const FRAGMENT_ID: NodeId = 0;

/// An XML document stored in arena format
#[derive(Debug)]
pub struct XmlDocument {
    /// Arena of nodes
    nodes: Vec<XmlNode>,
    /// DOCTYPE seen in the prolog
    doctype: Option<DoctypeInfo>,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDocument {
    /// Create an empty document holding only the fragment node
    pub fn new() -> Self {
        XmlDocument {
            nodes: vec![XmlNode::fragment()],
            doctype: None,
        }
    }

    /// Parse a document with default options
    pub fn parse(input: &str) -> Result<Self, SyntaxError> {
        Self::parse_with_options(input, ParseOptions::default())
    }

    /// Parse a document, attaching the roots under the fragment node
    pub fn parse_with_options(input: &str, options: ParseOptions) -> Result<Self, SyntaxError> {
        let mut doc = Self::new();
        let parsed = Parser::new(input, &mut doc, options).parse_document()?;

        for root in parsed.roots {
            doc.append(FRAGMENT_ID, root);
        }
        doc.doctype = parsed.doctype;

        Ok(doc)
    }

    /// Parse raw bytes, which must be UTF-8
    pub fn parse_bytes(input: &[u8], options: ParseOptions) -> Result<Self, DocumentError> {
        let text = std::str::from_utf8(input)?;
        Ok(Self::parse_with_options(text, options)?)
    }

    fn push(&mut self, node: XmlNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    /// Link `child_id` as the last child of `parent_id`
    fn append(&mut self, parent_id: NodeId, child_id: NodeId) {
        self.nodes[child_id as usize].parent = Some(parent_id);

        if let Some(last_child_id) = self.nodes[parent_id as usize].last_child {
            self.nodes[last_child_id as usize].next_sibling = Some(child_id);
        } else {
            // First child
            self.nodes[parent_id as usize].first_child = Some(child_id);
        }
        self.nodes[parent_id as usize].last_child = Some(child_id);
    }

    /// Get node count, including the fragment node
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    /// The DOCTYPE declaration, if any
    pub fn doctype(&self) -> Option<&DoctypeInfo> {
        self.doctype.as_ref()
    }

    /// Root elements in document order
    pub fn roots(&self) -> ChildIter<'_> {
        self.children(FRAGMENT_ID)
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get_node(id)
            .filter(|n| n.is_element())
            .map(|n| &*n.value)
    }

    /// Character data of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get_node(id).filter(|n| n.is_text()).map(|n| &*n.value)
    }

    /// Get attributes for an element
    pub fn attributes(&self, id: NodeId) -> &[XmlAttribute] {
        self.get_node(id)
            .map(|n| n.attributes.as_slice())
            .unwrap_or(&[])
    }

    /// Get attribute value by name
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|attr| &*attr.name == name)
            .map(|attr| &*attr.value)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        match self.get_node(id) {
            None => return result,
            Some(node) if node.is_text() => {
                result.push_str(&node.value);
                return result;
            }
            Some(_) => {}
        }

        // Explicit stack of sibling iterators, one per open element
        let mut stack = vec![self.children(id)];
        while let Some(children) = stack.last_mut() {
            match children.next() {
                Some(child) => match self.get_node(child) {
                    Some(node) if node.is_text() => result.push_str(&node.value),
                    Some(_) => stack.push(self.children(child)),
                    None => {}
                },
                None => {
                    stack.pop();
                }
            }
        }
        result
    }
}

impl DocumentFactory for XmlDocument {
    type Element = NodeId;
    type Node = NodeId;

    fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.push(XmlNode::element(tag_name))
    }

    fn create_text_node(&mut self, data: &str) -> NodeId {
        self.push(XmlNode::text(data))
    }

    fn set_attribute(&mut self, element: &mut NodeId, name: &str, value: &str) {
        self.nodes[*element as usize].set_attribute(name, value);
    }

    fn append_child(&mut self, element: &mut NodeId, child: NodeId) {
        self.append(*element, child);
    }

    fn finish_element(&mut self, element: NodeId) -> NodeId {
        element
    }
}

/// Iterator over child nodes
pub struct ChildIter<'d> {
    doc: &'d XmlDocument,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}
