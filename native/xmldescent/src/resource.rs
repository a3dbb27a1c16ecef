//! ResourceArc Wrappers
//!
//! Parsed documents kept on the Rust side between NIF calls.

use crate::dom::XmlDocument;
use rustler::ResourceArc;

/// Wrapper for XmlDocument that can be stored in a ResourceArc.
/// The document is immutable once parsed, so no lock is needed.
pub struct DocumentResource {
    pub doc: XmlDocument,
}

impl DocumentResource {
    pub fn new(doc: XmlDocument) -> Self {
        DocumentResource { doc }
    }
}

#[rustler::resource_impl]
impl rustler::Resource for DocumentResource {}

/// Type alias for document ResourceArc
pub type DocumentRef = ResourceArc<DocumentResource>;
