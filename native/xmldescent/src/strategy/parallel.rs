//! Parallel batch parsing
//!
//! Uses Rayon to parse independent documents on the thread pool. Each
//! document gets its own parser; only the static entity table is shared.

use rayon::prelude::*;

use crate::core::error::DocumentError;
use crate::dom::XmlDocument;
use crate::options::ParseOptions;

/// Parse every input in parallel, returning results in input order
pub fn parse_parallel(inputs: &[&[u8]]) -> Vec<Result<XmlDocument, DocumentError>> {
    inputs
        .par_iter()
        .map(|input| XmlDocument::parse_bytes(input, ParseOptions::default()))
        .collect()
}
