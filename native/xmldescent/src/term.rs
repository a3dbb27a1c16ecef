//! Elixir Term Conversion Utilities
//!
//! Node terms:
//! - element: `{:element, name, [{attr, value}], children}`
//! - text: binary

use rustler::{Encoder, Env, NewBinary, NifResult, Term};

use crate::core::error::{DocumentError, SyntaxError};
use crate::dom::document::ChildIter;
use crate::dom::{DocumentFactory, NodeId, NodeKind, XmlDocument, XmlNode};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    element,
    syntax_error,
    invalid_utf8,
    line,
    column,
    source_name,
    expected,
    actual,
    message,
}

/// Element whose children are still being parsed
pub struct PendingElement<'a> {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Term<'a>>,
}

/// Builds Elixir terms directly while the parser runs
pub struct TermFactory<'a> {
    env: Env<'a>,
}

impl<'a> TermFactory<'a> {
    pub fn new(env: Env<'a>) -> Self {
        TermFactory { env }
    }
}

impl<'a> DocumentFactory for TermFactory<'a> {
    type Element = PendingElement<'a>;
    type Node = Term<'a>;

    fn create_element(&mut self, tag_name: &str) -> PendingElement<'a> {
        PendingElement {
            name: tag_name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn create_text_node(&mut self, data: &str) -> Term<'a> {
        str_to_binary(self.env, data)
    }

    fn set_attribute(&mut self, element: &mut PendingElement<'a>, name: &str, value: &str) {
        match element.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => element.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn append_child(&mut self, element: &mut PendingElement<'a>, child: Term<'a>) {
        element.children.push(child);
    }

    fn finish_element(&mut self, element: PendingElement<'a>) -> Term<'a> {
        let env = self.env;
        let attrs = attributes_to_term(
            env,
            element.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str())),
        );
        (
            self::element(),
            str_to_binary(env, &element.name),
            attrs,
            element.children,
        )
            .encode(env)
    }
}

/// Convert the root elements of an arena document to a list of node terms
pub fn document_to_term<'a>(env: Env<'a>, doc: &XmlDocument) -> Term<'a> {
    let roots: Vec<Term<'a>> = doc.roots().map(|id| node_to_term(env, doc, id)).collect();
    roots.encode(env)
}

/// Element whose child terms are being collected
struct Frame<'d, 'a> {
    node: &'d XmlNode,
    children: ChildIter<'d>,
    terms: Vec<Term<'a>>,
}

/// Convert a node to an Elixir term.
/// Walks with an explicit stack, so tree depth is bounded only by memory.
pub fn node_to_term<'a>(env: Env<'a>, doc: &XmlDocument, node_id: NodeId) -> Term<'a> {
    let node = match doc.get_node(node_id) {
        Some(n) => n,
        None => return rustler::types::atom::nil().encode(env),
    };

    match node.kind {
        NodeKind::Element => {}
        NodeKind::Text => return str_to_binary(env, &node.value),
        NodeKind::DocumentFragment => return document_to_term(env, doc),
    }

    let mut stack = vec![Frame {
        node,
        children: doc.children(node_id),
        terms: Vec::new(),
    }];

    while let Some(frame) = stack.last_mut() {
        if let Some(child_id) = frame.children.next() {
            let Some(child) = doc.get_node(child_id) else {
                continue;
            };
            if child.is_element() {
                stack.push(Frame {
                    node: child,
                    children: doc.children(child_id),
                    terms: Vec::new(),
                });
            } else {
                frame.terms.push(str_to_binary(env, &child.value));
            }
            continue;
        }

        let Some(done) = stack.pop() else {
            break;
        };
        let term = element_to_term(env, done.node, done.terms);
        match stack.last_mut() {
            Some(parent) => parent.terms.push(term),
            None => return term,
        }
    }

    rustler::types::atom::nil().encode(env)
}

/// `{:element, name, attrs, children}`
fn element_to_term<'a>(env: Env<'a>, node: &XmlNode, children: Vec<Term<'a>>) -> Term<'a> {
    let attrs = attributes_to_term(
        env,
        node.attributes.iter().map(|a| (&*a.name, &*a.value)),
    );
    (element(), str_to_binary(env, &node.value), attrs, children).encode(env)
}

/// `{:error, reason}` for a failed parse
pub fn document_error_to_term<'a>(env: Env<'a>, err: &DocumentError) -> NifResult<Term<'a>> {
    match err {
        DocumentError::InvalidUtf8(_) => Ok((error(), invalid_utf8()).encode(env)),
        DocumentError::Syntax(syntax) => syntax_error_to_term(env, syntax),
    }
}

/// `{:error, {:syntax_error, %{line: .., column: .., ...}}}`
pub fn syntax_error_to_term<'a>(env: Env<'a>, err: &SyntaxError) -> NifResult<Term<'a>> {
    let details = Term::map_from_pairs(
        env,
        &[
            (line().encode(env), err.line.encode(env)),
            (column().encode(env), err.column.encode(env)),
            (source_name().encode(env), str_to_binary(env, &err.source_name)),
            (expected().encode(env), str_to_binary(env, &err.expected)),
            (actual().encode(env), str_to_binary(env, &err.actual)),
            (message().encode(env), str_to_binary(env, &err.to_string())),
        ],
    )?;
    Ok((error(), (syntax_error(), details)).encode(env))
}

/// Build `[{name, value}]`, keeping attribute order
fn attributes_to_term<'a, 's, I>(env: Env<'a>, attributes: I) -> Term<'a>
where
    I: DoubleEndedIterator<Item = (&'s str, &'s str)>,
{
    let mut list = Term::list_new_empty(env);
    for (name, value) in attributes.rev() {
        let tuple = (str_to_binary(env, name), str_to_binary(env, value));
        list = list.list_prepend(tuple.encode(env));
    }
    list
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
