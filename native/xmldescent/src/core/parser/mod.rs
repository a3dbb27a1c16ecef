//! Recursive-descent grammar engine
//!
//! Each rule either consumes input and returns `Some`/`true`, or consumes
//! nothing and returns `None`/`false` so the caller can try the next
//! alternative. A rule that fails after committing to a construct raises a
//! `SyntaxError`. There is no backtracking and no error recovery.
//!
//! Productions:
//! - Document = Prolog (Element Misc*)+
//! - Prolog   = Misc* DoctypeDecl? Misc*
//! - Misc     = Comment | PI | S
//! - Element  = EmptyElemTag | STag Content ETag
//! - Content  = (CharData | CDSect | PI | Comment | Element)*

mod doctype;

pub use doctype::{DoctypeInfo, ExternalId};

use std::borrow::Cow;

use tracing::{debug, trace};

use super::entities::{expand_references, normalize_line_endings};
use super::error::SyntaxError;
use super::scanner::Scanner;
use crate::dom::DocumentFactory;
use crate::options::ParseOptions;

/// Result of scanning one item of element content
enum ContentItem<N> {
    /// Text or child element
    Node(N),
    /// Comment, processing instruction or CDATA section
    Nothing,
}

/// Everything a successful parse produces
#[derive(Debug)]
pub struct ParsedDocument<N> {
    /// Root-level elements in document order
    pub roots: Vec<N>,
    /// The DOCTYPE declaration, if the prolog had one
    pub doctype: Option<DoctypeInfo>,
}

/// Single-use parser over one source buffer
pub struct Parser<'a, 'f, F: DocumentFactory> {
    scanner: Scanner<'a>,
    factory: &'f mut F,
    options: ParseOptions,
    /// Elements currently open
    depth: usize,
}

impl<'a, 'f, F: DocumentFactory> Parser<'a, 'f, F> {
    pub fn new(source: &'a str, factory: &'f mut F, options: ParseOptions) -> Self {
        Parser {
            scanner: Scanner::new(source),
            factory,
            options,
            depth: 0,
        }
    }

    /// Parse the whole buffer and return the root nodes
    pub fn parse(self) -> Result<Vec<F::Node>, SyntaxError> {
        self.parse_document().map(|document| document.roots)
    }

    /// Parse the whole buffer, keeping the DOCTYPE information as well
    pub fn parse_document(mut self) -> Result<ParsedDocument<F::Node>, SyntaxError> {
        debug!(
            source = self.options.source_name(),
            bytes = self.scanner.remaining().len(),
            "parsing XML document"
        );

        let result = self.document();
        match &result {
            Ok(document) => debug!(roots = document.roots.len(), "parsed XML document"),
            Err(error) => debug!(%error, offset = self.scanner.position(), "XML document rejected"),
        }
        result
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    fn error<T>(&self, actual: impl Into<String>, expected: impl Into<String>) -> Result<T, SyntaxError> {
        Err(SyntaxError::new(
            actual,
            expected,
            self.scanner.column(),
            self.options.source_name(),
            self.scanner.line(),
        ))
    }

    /// Fail with the next char (or "end of input") as the offending text
    fn unexpected<T>(&self, expected: impl Into<String>) -> Result<T, SyntaxError> {
        self.error(self.scanner.peek_display_char(), expected)
    }

    fn require_space(&mut self) -> Result<(), SyntaxError> {
        match self.scanner.try_space() {
            Some(_) => Ok(()),
            None => self.unexpected("whitespace"),
        }
    }

    // ========================================================================
    // Document structure
    // ========================================================================

    fn document(&mut self) -> Result<ParsedDocument<F::Node>, SyntaxError> {
        let doctype = self.prolog()?;

        let mut roots = Vec::new();
        while let Some(root) = self.element()? {
            roots.push(root);
            while self.misc()? {}
        }

        if roots.is_empty() {
            return self.unexpected("root element");
        }
        if !self.scanner.is_eof() {
            return self.unexpected("element, comment, processing instruction, or end of document");
        }

        Ok(ParsedDocument { roots, doctype })
    }

    fn prolog(&mut self) -> Result<Option<DoctypeInfo>, SyntaxError> {
        while self.misc()? {}
        let doctype = self.doctype_decl()?;
        while self.misc()? {}
        Ok(doctype)
    }

    fn misc(&mut self) -> Result<bool, SyntaxError> {
        Ok(self.comment()? || self.pi()? || self.scanner.try_space().is_some())
    }

    // ========================================================================
    // Elements and attributes
    // ========================================================================

    fn element(&mut self) -> Result<Option<F::Node>, SyntaxError> {
        if self.scanner.peek_literal("</") || self.scanner.try_literal("<").is_none() {
            return Ok(None);
        }
        if self.depth >= self.options.max_depth {
            return self.unexpected(format!("element nesting depth <= {}", self.options.max_depth));
        }

        let Some(name) = self.scanner.try_name() else {
            return self.unexpected("element name");
        };
        trace!(tag = name, depth = self.depth + 1, line = self.scanner.line(), "start tag");

        let mut element = self.factory.create_element(name);
        while let Some((attr_name, value)) = self.attribute()? {
            self.factory.set_attribute(&mut element, attr_name, &value);
        }

        self.scanner.try_space();

        if self.scanner.try_literal("/>").is_some() {
            return Ok(Some(self.factory.finish_element(element)));
        }
        if self.scanner.try_literal(">").is_none() {
            return self.unexpected("'>'");
        }

        self.depth += 1;
        while let Some(item) = self.content_item()? {
            if let ContentItem::Node(node) = item {
                self.factory.append_child(&mut element, node);
            }
        }
        self.depth -= 1;

        if !self.end_tag(name)? {
            return self.unexpected(format!("'/>' or </{name}>"));
        }

        Ok(Some(self.factory.finish_element(element)))
    }

    fn end_tag(&mut self, start_name: &str) -> Result<bool, SyntaxError> {
        if self.scanner.try_literal("</").is_none() {
            return Ok(false);
        }

        let Some(name) = self.scanner.try_name() else {
            return self.unexpected("element name");
        };
        if name != start_name {
            return self.error(name, format!("'{start_name}'"));
        }

        self.scanner.try_space();

        if self.scanner.try_literal(">").is_none() {
            return self.unexpected("'>'");
        }
        Ok(true)
    }

    fn attribute(&mut self) -> Result<Option<(&'a str, Cow<'a, str>)>, SyntaxError> {
        if self.scanner.try_space().is_none() {
            return Ok(None);
        }
        let Some(name) = self.scanner.try_name() else {
            return Ok(None);
        };

        if !self.eq() {
            return self.unexpected("'='");
        }

        match self.att_value()? {
            Some(value) => Ok(Some((name, value))),
            None => self.unexpected("quoted attribute value"),
        }
    }

    fn eq(&mut self) -> bool {
        self.scanner.try_space();
        if self.scanner.try_literal("=").is_none() {
            return false;
        }
        self.scanner.try_space();
        true
    }

    /// Quoted value with references expanded. Line endings are kept.
    fn att_value(&mut self) -> Result<Option<Cow<'a, str>>, SyntaxError> {
        for (quote, delimiter, expected) in [('"', "\"", "'\"'"), ('\'', "'", "\"'\"")] {
            if self.scanner.try_literal(delimiter).is_none() {
                continue;
            }

            let raw = self.scanner.take_while(|c| c != '<' && c != quote);

            if self.scanner.try_literal(delimiter).is_none() {
                return self.unexpected(expected);
            }
            return Ok(Some(expand_references(raw)));
        }
        Ok(None)
    }

    // ========================================================================
    // Content
    // ========================================================================

    fn content_item(&mut self) -> Result<Option<ContentItem<F::Node>>, SyntaxError> {
        if let Some(text) = self.char_data() {
            return Ok(Some(ContentItem::Node(text)));
        }
        if self.cdata_section()? || self.pi()? || self.comment()? {
            return Ok(Some(ContentItem::Nothing));
        }
        Ok(self.element()?.map(ContentItem::Node))
    }

    fn char_data(&mut self) -> Option<F::Node> {
        let raw = self.scanner.try_while1(|c| c != '<')?;
        let data = normalize_line_endings(expand_references(raw));
        Some(self.factory.create_text_node(&data))
    }

    /// CDATA content is consumed and discarded
    fn cdata_section(&mut self) -> Result<bool, SyntaxError> {
        if self.scanner.try_literal("<![CDATA[").is_none() {
            return Ok(false);
        }
        self.scanner.take_until("]]>");
        if self.scanner.try_literal("]]>").is_none() {
            return self.unexpected("]]>");
        }
        Ok(true)
    }

    /// Processing instructions (including the XML declaration) are discarded
    fn pi(&mut self) -> Result<bool, SyntaxError> {
        if self.scanner.try_literal("<?").is_none() {
            return Ok(false);
        }
        self.scanner.take_until("?>");
        if self.scanner.try_literal("?>").is_none() {
            return self.unexpected("?>");
        }
        Ok(true)
    }

    fn comment(&mut self) -> Result<bool, SyntaxError> {
        if self.scanner.try_literal("<!--").is_none() {
            return Ok(false);
        }
        self.scanner.take_match(comment_body_len);
        if self.scanner.try_literal("-->").is_none() {
            return self.unexpected("-->");
        }
        Ok(true)
    }
}

/// Length of the longest prefix matching `([^-] | -[^-])*`
fn comment_body_len(text: &str) -> usize {
    let mut chars = text.char_indices();
    let mut end = 0;

    while let Some((i, c)) = chars.next() {
        if c != '-' {
            end = i + c.len_utf8();
            continue;
        }
        match chars.next() {
            Some((j, next)) if next != '-' => end = j + next.len_utf8(),
            _ => break,
        }
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{NodeId, XmlDocument};

    fn parse(input: &str) -> Result<XmlDocument, SyntaxError> {
        XmlDocument::parse(input)
    }

    fn roots(doc: &XmlDocument) -> Vec<NodeId> {
        doc.roots().collect()
    }

    fn single_root(input: &str) -> (XmlDocument, NodeId) {
        let doc = parse(input).unwrap();
        let ids = roots(&doc);
        assert_eq!(ids.len(), 1, "expected one root in {input:?}");
        let root = ids[0];
        (doc, root)
    }

    fn first_text(input: &str) -> String {
        let (doc, root) = single_root(input);
        let child = doc.children(root).next().unwrap();
        doc.text(child).unwrap().to_string()
    }

    #[test]
    fn test_empty_element_tag() {
        for input in ["<br/>", "<br />"] {
            let (doc, root) = single_root(input);
            assert_eq!(doc.tag_name(root), Some("br"));
            assert!(doc.attributes(root).is_empty());
            assert_eq!(doc.children(root).count(), 0);
        }
    }

    #[test]
    fn test_attributes() {
        let (doc, root) = single_root("<input type=\"text\"  name=\"foo\" />");
        assert_eq!(doc.attributes(root).len(), 2);
        assert_eq!(doc.get_attribute(root, "type"), Some("text"));
        assert_eq!(doc.get_attribute(root, "name"), Some("foo"));
    }

    #[test]
    fn test_attribute_quoting_and_spacing() {
        let (doc, root) = single_root("<div id='abcd' class = \"x\"\n\tdata-x\t=\t'y'/>");
        assert_eq!(doc.get_attribute(root, "id"), Some("abcd"));
        assert_eq!(doc.get_attribute(root, "class"), Some("x"));
        assert_eq!(doc.get_attribute(root, "data-x"), Some("y"));
    }

    #[test]
    fn test_attribute_references_expanded_without_line_normalization() {
        let (doc, root) = single_root("<div data-title=\"this &amp; that\" alt='a\r\nb &#x41;' />");
        assert_eq!(doc.get_attribute(root, "data-title"), Some("this & that"));
        assert_eq!(doc.get_attribute(root, "alt"), Some("a\r\nb A"));
    }

    #[test]
    fn test_quotes_inside_other_quotes() {
        let (doc, root) = single_root("<q a=\"it's\" b='say \"hi\"'/>");
        assert_eq!(doc.get_attribute(root, "a"), Some("it's"));
        assert_eq!(doc.get_attribute(root, "b"), Some("say \"hi\""));
    }

    #[test]
    fn test_duplicate_attribute_last_write_wins() {
        let (doc, root) = single_root("<a x='1' x='2'/>");
        assert_eq!(doc.attributes(root).len(), 1);
        assert_eq!(doc.get_attribute(root, "x"), Some("2"));
    }

    #[test]
    fn test_malformed_start_tags() {
        for input in [
            "<>",
            "<div <p>",
            "<div class\"shiny\">",
            "<div class=shiny>",
            "<div class=\"sh<iny\">",
            "<div class='shiny> <p>",
            "<div class=\"",
        ] {
            assert!(parse(input).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn test_missing_element_name_error() {
        let err = parse("<>").unwrap_err();
        assert_eq!(err.expected, "element name");
        assert_eq!(err.actual, ">");
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 2);
        assert_eq!(err.source_name, "<INPUT>");
    }

    #[test]
    fn test_missing_equals_error() {
        let err = parse("<div class\"shiny\">").unwrap_err();
        assert_eq!(err.expected, "'='");
        assert_eq!(err.actual, "\"");
    }

    #[test]
    fn test_unterminated_value_at_end_of_input() {
        let err = parse("<div class=\"").unwrap_err();
        assert_eq!(err.expected, "'\"'");
        assert_eq!(err.actual, "end of input");
    }

    #[test]
    fn test_element_without_content() {
        let (doc, root) = single_root("<strong></strong>");
        assert_eq!(doc.tag_name(root), Some("strong"));
        assert_eq!(doc.children(root).count(), 0);
    }

    #[test]
    fn test_unterminated_element() {
        let err = parse("<strong>").unwrap_err();
        assert_eq!(err.expected, "'/>' or </strong>");
        assert_eq!(err.actual, "end of input");
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = parse("<strong>bold</b>").unwrap_err();
        assert_eq!(err.actual, "b");
        assert_eq!(err.expected, "'strong'");
        assert!(err.to_string().contains("expecting 'strong', but encountered 'b'"));
    }

    #[test]
    fn test_end_tag_allows_trailing_space() {
        let (doc, root) = single_root("<p>x</p \n>");
        assert_eq!(doc.tag_name(root), Some("p"));
    }

    #[test]
    fn test_text_content() {
        assert_eq!(first_text("<strong>bold!</strong>"), "bold!");
        assert_eq!(first_text("<strong>bold &lt; smart</strong>"), "bold < smart");
    }

    #[test]
    fn test_character_references_in_content() {
        assert_eq!(first_text("<div>6 &#xf7; 2 = 3</div>"), "6 \u{f7} 2 = 3");
        assert_eq!(first_text("<div>6 &#247; 2 = 3</div>"), "6 \u{f7} 2 = 3");
    }

    #[test]
    fn test_all_predefined_entities() {
        assert_eq!(
            first_text("<t>&amp;&lt;&gt;&quot;&apos;&#x41;&#66;</t>"),
            "&<>\"'AB"
        );
    }

    #[test]
    fn test_line_endings_normalized_in_content() {
        assert_eq!(
            first_text("<strong>bold\r\nbold\rbold\nbold</strong>"),
            "bold\nbold\nbold\nbold"
        );
    }

    #[test]
    fn test_nested_element() {
        let (doc, root) = single_root("<strong><br /></strong>");
        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.tag_name(children[0]), Some("br"));
    }

    #[test]
    fn test_cdata_discarded() {
        let (doc, root) = single_root("<div><![CDATA[<markup />]]></div>");
        assert_eq!(doc.children(root).count(), 0);

        let (doc, root) = single_root("<div><![CDATA[\n\n<markup />\n\n  ]]></div>");
        assert_eq!(doc.children(root).count(), 0);
    }

    #[test]
    fn test_malformed_cdata() {
        let err = parse("<div><![CDATA[<markup />] ]></div>").unwrap_err();
        assert_eq!(err.expected, "]]>");
        assert_eq!(err.actual, "end of input");
    }

    #[test]
    fn test_processing_instruction_discarded() {
        let (doc, root) = single_root("<div><?custom-target info=\"foo\" ?></div>");
        assert_eq!(doc.children(root).count(), 0);

        let err = parse("<div><?custom-target info=\"foo\" ></div>").unwrap_err();
        assert_eq!(err.expected, "?>");
        assert_eq!(err.actual, "end of input");
    }

    #[test]
    fn test_comment_discarded() {
        let (doc, root) = single_root("<div><!-- some comment --></div>");
        assert_eq!(doc.children(root).count(), 0);

        let (doc, root) = single_root("<div><!-- a-b\n- c --></div>");
        assert_eq!(doc.children(root).count(), 0);
    }

    #[test]
    fn test_malformed_comment() {
        let err = parse("<div><!-- uh oh ---></div>").unwrap_err();
        assert_eq!(err.expected, "-->");
        assert_eq!(err.actual, "-");
    }

    #[test]
    fn test_comment_body_len() {
        assert_eq!(comment_body_len(" plain -->"), 7);
        assert_eq!(comment_body_len("a-b-->"), 3);
        assert_eq!(comment_body_len("trailing-"), 8);
        assert_eq!(comment_body_len("é-ü-->"), "é-ü".len());
    }

    #[test]
    fn test_mixed_content_order() {
        let (doc, root) = single_root("<div>Some <strong><em>strong</em></strong> words.</div>");
        assert_eq!(doc.tag_name(root), Some("div"));

        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 3);
        assert_eq!(doc.text(children[0]), Some("Some "));
        assert_eq!(doc.tag_name(children[1]), Some("strong"));
        assert_eq!(doc.text(children[2]), Some(" words."));

        let em = doc.children(children[1]).next().unwrap();
        assert_eq!(doc.tag_name(em), Some("em"));
        assert_eq!(doc.text_content(em), "strong");
    }

    #[test]
    fn test_discarded_items_split_text() {
        let (doc, root) = single_root("<p>a<!-- x -->b</p>");
        let texts: Vec<_> = doc.children(root).filter_map(|id| doc.text(id)).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_multiple_roots() {
        let doc = parse("<br id=\"a\" /><br id=\"b\" /><br id=\"c\" />").unwrap();
        let ids = roots(&doc);
        assert_eq!(ids.len(), 3);
        assert_eq!(doc.get_attribute(ids[2], "id"), Some("c"));

        let doc = parse("  <br id=\"a\" />\n  <br id=\"b\" />\n  <br id=\"c\" />\n").unwrap();
        assert_eq!(roots(&doc).len(), 3);
    }

    #[test]
    fn test_trailing_misc() {
        let (doc, root) = single_root("<html>\n</html>\n<!-- the end --><?done?>\n");
        assert_eq!(doc.tag_name(root), Some("html"));
    }

    #[test]
    fn test_trailing_unparsed_content() {
        let err = parse("<html>\n</html>\nthe end!").unwrap_err();
        assert_eq!(err.actual, "t");
        assert_eq!(err.expected, "element, comment, processing instruction, or end of document");
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 1);
    }

    #[test]
    fn test_empty_document() {
        let err = parse("").unwrap_err();
        assert_eq!(err.expected, "root element");
        assert_eq!(err.actual, "end of input");

        assert!(parse("  <!-- only a comment -->  ").is_err());
    }

    #[test]
    fn test_xml_declaration_prolog() {
        let (doc, root) = single_root("<?xml version=\"1.0\"?>\n<!DOCTYPE html>\n<html>\n</html>");
        assert_eq!(doc.tag_name(root), Some("html"));
    }

    #[test]
    fn test_error_line_and_column() {
        let err = parse("<a>\r\n  <b>\n    <c x=1/>").unwrap_err();
        assert_eq!(err.expected, "quoted attribute value");
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 10);
        assert_eq!(
            err.to_string(),
            "XML syntax error at line 3, column 10 of <INPUT>: expecting quoted attribute value, but encountered '1'"
        );
    }

    #[test]
    fn test_lines_counted_inside_discarded_items() {
        let err = parse("<a><!--\n\n--><![CDATA[\r\n]]><?pi\r?>\n<b></a>").unwrap_err();
        assert_eq!(err.line, 6);
        assert_eq!(err.actual, "a");
        assert_eq!(err.expected, "'b'");
    }

    fn parse_with_depth(input: &str, max_depth: usize) -> Result<Vec<NodeId>, SyntaxError> {
        let mut doc = XmlDocument::new();
        let options = ParseOptions::new().with_max_depth(max_depth);
        Parser::new(input, &mut doc, options).parse()
    }

    #[test]
    fn test_nesting_depth_limit() {
        assert!(parse_with_depth("<a><b><c/></b></a>", 3).is_ok());
        assert!(parse_with_depth("<a><b><c></c></b></a>", 3).is_ok());

        let err = parse_with_depth("<a><b><c><d/></c></b></a>", 3).unwrap_err();
        assert_eq!(err.expected, "element nesting depth <= 3");
        assert_eq!(err.actual, "d");
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 11);
    }

    #[test]
    fn test_siblings_do_not_add_depth() {
        let input = format!("<r>{}</r><r/>", "<x><y/></x>".repeat(1000));
        assert_eq!(parse_with_depth(&input, 3).unwrap().len(), 2);
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let depth = crate::options::DEFAULT_MAX_DEPTH;
        let at_limit = format!("{}x{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let (doc, root) = single_root(&at_limit);
        assert_eq!(doc.text_content(root), "x");

        let past_limit = format!("{}{}", "<a>".repeat(depth + 1), "</a>".repeat(depth + 1));
        let err = parse(&past_limit).unwrap_err();
        assert_eq!(err.expected, format!("element nesting depth <= {depth}"));

        let very_deep = format!("{}{}", "<a>".repeat(20_000), "</a>".repeat(20_000));
        assert!(parse(&very_deep).is_err());
    }

    #[test]
    fn test_source_name_in_errors() {
        let mut doc = XmlDocument::new();
        let options = ParseOptions::new().with_source_name("feed.xml");
        let err = Parser::new("<a>", &mut doc, options).parse().unwrap_err();
        assert_eq!(err.source_name, "feed.xml");
        assert!(err.to_string().contains("of feed.xml:"));
    }

    /// Factory that records the calls it receives
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl DocumentFactory for Recorder {
        type Element = String;
        type Node = String;

        fn create_element(&mut self, tag_name: &str) -> String {
            self.calls.push(format!("create {tag_name}"));
            tag_name.to_string()
        }

        fn create_text_node(&mut self, data: &str) -> String {
            self.calls.push(format!("text {data:?}"));
            format!("#{data}")
        }

        fn set_attribute(&mut self, element: &mut String, name: &str, value: &str) {
            self.calls.push(format!("{element}[{name}={value}]"));
        }

        fn append_child(&mut self, element: &mut String, child: String) {
            self.calls.push(format!("{element} <- {child}"));
        }

        fn finish_element(&mut self, element: String) -> String {
            self.calls.push(format!("finish {element}"));
            element
        }
    }

    #[test]
    fn test_factory_call_sequence() {
        let mut recorder = Recorder::default();
        let roots = Parser::new("<a k='v'>t<b/></a><c/>", &mut recorder, ParseOptions::new())
            .parse()
            .unwrap();

        assert_eq!(roots, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(
            recorder.calls,
            vec![
                "create a",
                "a[k=v]",
                "text \"t\"",
                "a <- #t",
                "create b",
                "finish b",
                "a <- b",
                "finish a",
                "create c",
                "finish c",
            ]
        );
    }
}
