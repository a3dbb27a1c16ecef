//! XmlDescent - Recursive-descent XML parsing
//!
//! Parses a practical XML subset (elements, attributes, character data,
//! references, comments, processing instructions, CDATA sections and a
//! prolog with DOCTYPE / internal subset) into nodes built by an injected
//! `DocumentFactory`.
//!
//! Entry points:
//! - Rust: `Parser`, `parse_with`, `XmlDocument::parse`
//! - NIF: parse, parse_document, document_roots, parse_batch

use rustler::{Binary, Encoder, Env, NifResult, ResourceArc, Term};

mod core;
pub mod dom;
pub mod options;
mod resource;
pub mod strategy;
mod term;

pub use crate::core::entities::{expand_references, normalize_line_endings, PREDEFINED_ENTITIES};
pub use crate::core::error::{DocumentError, SyntaxError};
pub use crate::core::parser::{DoctypeInfo, ExternalId, ParsedDocument, Parser};
pub use dom::{DocumentFactory, XmlDocument};
pub use options::ParseOptions;

use resource::{DocumentRef, DocumentResource};
use term::TermFactory;

/// Parse `source` into root nodes built by `factory`, with default options
pub fn parse_with<F: DocumentFactory>(
    source: &str,
    factory: &mut F,
) -> Result<Vec<F::Node>, SyntaxError> {
    Parser::new(source, factory, ParseOptions::default()).parse()
}

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn options_for(source_name: Option<String>) -> ParseOptions {
    ParseOptions {
        source_name,
        ..ParseOptions::default()
    }
}

// ============================================================================
// Direct term building
// ============================================================================

/// Parse XML straight into Elixir terms
/// Returns {:ok, [node]} or {:error, reason}
/// Runs on a dirty scheduler since parse time grows with input size
#[rustler::nif(schedule = "DirtyCpu")]
fn parse<'a>(env: Env<'a>, input: Binary<'a>, source_name: Option<String>) -> NifResult<Term<'a>> {
    let text = match std::str::from_utf8(input.as_slice()) {
        Ok(text) => text,
        Err(e) => return term::document_error_to_term(env, &DocumentError::from(e)),
    };

    let mut factory = TermFactory::new(env);
    match Parser::new(text, &mut factory, options_for(source_name)).parse() {
        Ok(roots) => Ok((term::ok(), roots).encode(env)),
        Err(e) => term::syntax_error_to_term(env, &e),
    }
}

// ============================================================================
// Arena documents
// ============================================================================

/// Parse XML into an arena document held by a ResourceArc
/// Returns {:ok, doc} or {:error, reason}
#[rustler::nif(schedule = "DirtyCpu")]
fn parse_document<'a>(env: Env<'a>, input: Binary<'a>, source_name: Option<String>) -> NifResult<Term<'a>> {
    match XmlDocument::parse_bytes(input.as_slice(), options_for(source_name)) {
        Ok(doc) => {
            let arc = ResourceArc::new(DocumentResource::new(doc));
            Ok((term::ok(), arc).encode(env))
        }
        Err(e) => term::document_error_to_term(env, &e),
    }
}

/// Get the root nodes of a parsed document
#[rustler::nif(schedule = "DirtyCpu")]
fn document_roots<'a>(env: Env<'a>, doc_ref: DocumentRef) -> Term<'a> {
    term::document_to_term(env, &doc_ref.doc)
}

/// Parse several documents in parallel
/// Returns one {:ok, [node]} or {:error, reason} per input, in order
#[rustler::nif(schedule = "DirtyCpu")]
fn parse_batch<'a>(env: Env<'a>, inputs: Vec<Binary<'a>>) -> NifResult<Term<'a>> {
    let slices: Vec<&[u8]> = inputs.iter().map(|b| b.as_slice()).collect();
    let results = strategy::parallel::parse_parallel(&slices);

    let mut list = Term::list_new_empty(env);
    for result in results.into_iter().rev() {
        let term = match result {
            Ok(doc) => (term::ok(), term::document_to_term(env, &doc)).encode(env),
            Err(e) => term::document_error_to_term(env, &e)?,
        };
        list = list.list_prepend(term);
    }
    Ok(list)
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.XmlDescent.Native");
