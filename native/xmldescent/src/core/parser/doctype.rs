//! DOCTYPE declaration and internal subset
//!
//! Declarations are bounded syntactically and skipped. Content models,
//! attribute lists and entity values are never interpreted.

use super::{Parser, SyntaxError};
use crate::dom::DocumentFactory;

/// Keywords of the markup declarations allowed in the internal subset
const MARKUP_DECLARATIONS: [&str; 4] = ["<!NOTATION", "<!ENTITY", "<!ATTLIST", "<!ELEMENT"];

/// The recognized parts of a DOCTYPE declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctypeInfo {
    /// Document type name
    pub name: String,
    pub external_id: Option<ExternalId>,
    /// Whether a `[...]` internal subset was present
    pub has_internal_subset: bool,
}

/// `SYSTEM "uri"` or `PUBLIC "pubid" "uri"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalId {
    pub public_id: Option<String>,
    pub system_id: String,
}

/// PubidChar, excluding the apostrophe which depends on the quote in use
fn is_pubid_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || " \r\n-()+,./:=?;!*#@$_%".contains(c)
}

impl<'a, 'f, F: DocumentFactory> Parser<'a, 'f, F> {
    pub(super) fn doctype_decl(&mut self) -> Result<Option<DoctypeInfo>, SyntaxError> {
        if self.scanner.try_literal("<!DOCTYPE").is_none() {
            return Ok(None);
        }
        self.require_space()?;

        let Some(name) = self.scanner.try_name() else {
            return self.unexpected("document type name");
        };

        self.scanner.try_space();
        let external_id = self.external_id()?;
        self.scanner.try_space();
        let has_internal_subset = self.internal_subset()?;
        self.scanner.try_space();

        if self.scanner.try_literal(">").is_none() {
            return self.unexpected("'>'");
        }

        tracing::trace!(doctype = name, "DOCTYPE declaration");
        Ok(Some(DoctypeInfo {
            name: name.to_string(),
            external_id,
            has_internal_subset,
        }))
    }

    fn external_id(&mut self) -> Result<Option<ExternalId>, SyntaxError> {
        if self.scanner.try_literal("SYSTEM").is_some() {
            self.require_space()?;
            let system_id = self.system_literal()?;
            return Ok(Some(ExternalId { public_id: None, system_id }));
        }

        if self.scanner.try_literal("PUBLIC").is_some() {
            self.require_space()?;
            let public_id = self.pubid_literal()?;
            self.require_space()?;
            let system_id = self.system_literal()?;
            return Ok(Some(ExternalId {
                public_id: Some(public_id),
                system_id,
            }));
        }

        Ok(None)
    }

    fn system_literal(&mut self) -> Result<String, SyntaxError> {
        self.quoted_literal("system literal", |_| true)
    }

    fn pubid_literal(&mut self) -> Result<String, SyntaxError> {
        self.quoted_literal("public identifier literal", is_pubid_char)
    }

    /// A `"..."` or `'...'` literal whose chars (other than the quote)
    /// satisfy `allowed`
    fn quoted_literal<P>(&mut self, what: &str, allowed: P) -> Result<String, SyntaxError>
    where
        P: Fn(char) -> bool,
    {
        for (quote, delimiter, expected) in [('"', "\"", "'\"'"), ('\'', "'", "\"'\"")] {
            if self.scanner.try_literal(delimiter).is_none() {
                continue;
            }

            let literal = self.scanner.take_while(|c| c != quote && (allowed(c) || c == '\''));

            if self.scanner.try_literal(delimiter).is_none() {
                return self.unexpected(expected);
            }
            return Ok(literal.to_string());
        }
        self.unexpected(what)
    }

    fn internal_subset(&mut self) -> Result<bool, SyntaxError> {
        if self.scanner.try_literal("[").is_none() {
            return Ok(false);
        }

        while self.subset_item()? {}

        if self.scanner.try_literal("]").is_none() {
            return self.unexpected("markup declaration or ']'");
        }
        Ok(true)
    }

    fn subset_item(&mut self) -> Result<bool, SyntaxError> {
        Ok(self.pe_reference()?
            || self.scanner.try_space().is_some()
            || self.comment()?
            || self.pi()?
            || self.markup_decl()?)
    }

    /// `%name;`, recognized but not expanded
    fn pe_reference(&mut self) -> Result<bool, SyntaxError> {
        if self.scanner.try_literal("%").is_none() {
            return Ok(false);
        }
        if self.scanner.try_name().is_none() {
            return self.unexpected("parameter entity name");
        }
        if self.scanner.try_literal(";").is_none() {
            return self.unexpected("';'");
        }
        Ok(true)
    }

    fn markup_decl(&mut self) -> Result<bool, SyntaxError> {
        for keyword in MARKUP_DECLARATIONS {
            if self.scanner.try_literal(keyword).is_none() {
                continue;
            }
            if self.scanner.skip_balanced().is_none() {
                return self.unexpected("'>'");
            }
            return Ok(true);
        }
        Ok(false)
    }
}
