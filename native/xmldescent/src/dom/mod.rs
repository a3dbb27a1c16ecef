//! DOM Module - Document construction
//!
//! The parser never builds nodes itself. It drives a `DocumentFactory`,
//! so any tree representation can sit behind it:
//! - `XmlDocument`: arena of nodes with NodeId (u32) links
//! - `term::TermFactory`: Erlang terms built directly during the parse

pub mod document;
pub mod node;

pub use document::XmlDocument;
pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode};

/// Node construction capability the parser depends on
///
/// An element is created, receives its attributes, then its children, and
/// is finally turned into a node with `finish_element`. Text nodes are
/// nodes from the start.
pub trait DocumentFactory {
    /// Element under construction
    type Element;
    /// Finished node (element or text)
    type Node;

    /// Create an element with the given tag name
    fn create_element(&mut self, tag_name: &str) -> Self::Element;

    /// Create a text node holding already-expanded character data
    fn create_text_node(&mut self, data: &str) -> Self::Node;

    /// Assign an attribute. A repeated name replaces the earlier value.
    fn set_attribute(&mut self, element: &mut Self::Element, name: &str, value: &str);

    /// Append a child node after any existing children
    fn append_child(&mut self, element: &mut Self::Element, child: Self::Node);

    /// Complete an element so it can be appended or returned as a root
    fn finish_element(&mut self, element: Self::Element) -> Self::Node;
}
