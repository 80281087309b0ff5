//! Owned document tree built from quick-xml's namespace-aware reader
//!
//! FB2 lookups need random access (first `title-info`, direct children of
//! `body`, all descendant `section`s), so the event stream is folded into a
//! small tree of element and text nodes. Walks over the tree are iterative;
//! the only recursion left is `Drop`, which is bounded by
//! [`ParseLimits::max_depth`].

use std::borrow::Cow;
use std::collections::HashMap;

use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::error::{Fb2Error, LimitKind};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Default ceiling for element nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default ceiling for candidate chapter sections.
pub const DEFAULT_MAX_SECTIONS: usize = 10_000;

/// Resource ceilings applied while parsing a single document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseLimits {
    /// Maximum element nesting depth (the root element is depth 1).
    pub max_depth: usize,
    /// Maximum number of candidate sections the segmenter will accept.
    pub max_sections: usize,
}

impl ParseLimits {
    /// Create explicit limits.
    pub fn new(max_depth: usize, max_sections: usize) -> Self {
        Self {
            max_depth,
            max_sections,
        }
    }

    /// No ceilings at all.
    ///
    /// Only use this for trusted input: dropping an adversarially deep tree
    /// still recurses once per nesting level.
    pub fn unbounded() -> Self {
        Self::new(usize::MAX, usize::MAX)
    }

    /// Set the nesting depth ceiling.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the section count ceiling.
    pub fn with_max_sections(mut self, max_sections: usize) -> Self {
        self.max_sections = max_sections;
        self
    }
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, DEFAULT_MAX_SECTIONS)
    }
}

/// A node in the document tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Element with its own children
    Element(Element),
    /// Text run (adjacent text, entity references and CDATA are merged)
    Text(String),
}

/// An element with a resolved namespace and local name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    namespace: Option<String>,
    name: String,
    children: Vec<Node>,
}

impl Element {
    /// Create an element with no children.
    pub fn new(namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Local name (prefix stripped).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace URI the element was resolved to, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// All child nodes in document order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements only, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// All descendant elements in document order (pre-order, self excluded).
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    /// Concatenated text of every descendant text node, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self.children.iter()];
        while let Some(iter) = stack.last_mut() {
            match iter.next() {
                Some(Node::Text(text)) => out.push_str(text),
                Some(Node::Element(el)) => stack.push(el.children.iter()),
                None => {
                    stack.pop();
                }
            }
        }
        out
    }

    /// Append a child node.
    pub fn push_child(&mut self, node: Node) {
        match node {
            Node::Text(text) => self.push_text(&text),
            node => self.children.push(node),
        }
    }

    /// Append text, merging with a trailing text node.
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }
}

/// Pre-order iterator over descendant elements
pub struct Descendants<'a> {
    stack: Vec<core::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                Some(Node::Element(el)) => {
                    self.stack.push(el.children.iter());
                    return Some(el);
                }
                Some(Node::Text(_)) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Parse a complete XML document into its root element.
///
/// The encoding comes from the BOM or XML declaration when the `encoding`
/// feature is enabled; otherwise the input must be UTF-8.
pub fn parse_document(content: &[u8], limits: ParseLimits) -> Result<Element, Fb2Error> {
    let input = prepare_input(content)?;
    let mut reader = NsReader::from_reader(input.as_ref());
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut entities: HashMap<String, String> = HashMap::new();

    loop {
        let resolved = reader.read_resolved_event_into(&mut buf);
        let (namespace, event) = match resolved {
            Ok((ns, event)) => (owned_namespace(ns)?, event),
            Err(e) => {
                return Err(Fb2Error::Parse(format!(
                    "XML error at position {}: {}",
                    reader.error_position(),
                    e
                )))
            }
        };

        match event {
            Event::Start(e) => {
                open_element(&stack, &root, limits)?;
                let name = decode_bytes(&reader, e.local_name().as_ref())?;
                stack.push(Element::new(namespace, name));
            }
            Event::Empty(e) => {
                open_element(&stack, &root, limits)?;
                let name = decode_bytes(&reader, e.local_name().as_ref())?;
                close_element(&mut stack, &mut root, Element::new(namespace, name));
            }
            Event::End(_) => {
                // quick-xml already verified the end name matches
                if let Some(el) = stack.pop() {
                    close_element(&mut stack, &mut root, el);
                }
            }
            Event::Text(e) => {
                let text = e
                    .decode()
                    .map_err(|e| Fb2Error::Parse(format!("Decode error: {}", e)))?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(e) => {
                let text = decode_bytes(&reader, &e)?;
                push_text(&mut stack, &text)?;
            }
            Event::GeneralRef(e) => {
                let entity_name = e
                    .decode()
                    .map_err(|e| Fb2Error::Parse(format!("Decode error: {}", e)))?;
                let entity = format!("&{};", entity_name);
                let resolved = match unescape(&entity) {
                    Ok(text) => text.into_owned(),
                    Err(e) => entities.get(&*entity_name).cloned().ok_or_else(|| {
                        Fb2Error::Parse(format!("Unresolved entity {}: {}", entity, e))
                    })?,
                };
                push_text(&mut stack, &resolved)?;
            }
            Event::DocType(e) => {
                let dtd = e
                    .decode()
                    .map_err(|e| Fb2Error::Parse(format!("Decode error: {}", e)))?;
                entities = internal_entities(&dtd);
            }
            Event::Eof => break,
            // Declarations, comments and processing instructions carry
            // nothing the pipeline reads.
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(Fb2Error::Parse(format!(
            "Unexpected end of document: element <{}> is not closed",
            open.name()
        )));
    }

    let root = root.ok_or_else(|| Fb2Error::Parse("Document has no root element".into()))?;
    log::debug!(
        "[FB2] Parsed document tree (root <{}>, {} bytes)",
        root.name(),
        content.len()
    );
    Ok(root)
}

/// Bytes the reader can consume directly.
///
/// quick-xml cannot read UTF-16, so a UTF-16 document (recognized by its
/// BOM) is transcoded to UTF-8 up front. A UTF-8 BOM is dropped.
fn prepare_input(content: &[u8]) -> Result<Cow<'_, [u8]>, Fb2Error> {
    if let Some(utf8) = transcode_utf16(content)? {
        return Ok(Cow::Owned(utf8));
    }
    Ok(Cow::Borrowed(content.strip_prefix(UTF8_BOM).unwrap_or(content)))
}

#[cfg(feature = "encoding")]
fn transcode_utf16(content: &[u8]) -> Result<Option<Vec<u8>>, Fb2Error> {
    let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(content) else {
        return Ok(None);
    };
    if encoding != encoding_rs::UTF_16LE && encoding != encoding_rs::UTF_16BE {
        return Ok(None);
    }
    let text = encoding
        .decode_without_bom_handling_and_without_replacement(&content[bom_len..])
        .ok_or_else(|| {
            Fb2Error::Parse(format!(
                "Decode error: input is not valid {}",
                encoding.name()
            ))
        })?;
    log::debug!(
        "[FB2] Transcoded {} input to UTF-8 ({} bytes)",
        encoding.name(),
        content.len()
    );
    // The declaration still names UTF-16 and would switch the reader back
    Ok(Some(strip_xml_declaration(&text).as_bytes().to_vec()))
}

#[cfg(not(feature = "encoding"))]
fn transcode_utf16(_content: &[u8]) -> Result<Option<Vec<u8>>, Fb2Error> {
    Ok(None)
}

#[cfg(feature = "encoding")]
fn strip_xml_declaration(text: &str) -> &str {
    let is_declaration = text
        .strip_prefix("<?xml")
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_whitespace()));
    if is_declaration {
        if let Some(end) = text.find("?>") {
            return &text[end + 2..];
        }
    }
    text
}

/// General entities declared with a literal value in an internal DTD
/// subset. Parameter and external entities are ignored; the first
/// declaration of a name wins. Values are not expanded recursively.
fn internal_entities(dtd: &str) -> HashMap<String, String> {
    const DECL: &str = "<!ENTITY";

    let mut entities = HashMap::new();
    let mut rest = dtd;
    while let Some(start) = rest.find(DECL) {
        rest = rest[start + DECL.len()..].trim_start();
        if rest.starts_with('%') {
            continue;
        }
        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (name, after) = rest.split_at(name_end);
        rest = after.trim_start();

        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let Some(len) = rest[1..].find(quote) else {
            break;
        };
        let raw = &rest[1..1 + len];
        let value = unescape(raw)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| raw.to_string());
        entities.entry(name.to_string()).or_insert(value);
        rest = &rest[len + 2..];
    }
    entities
}

fn open_element(
    stack: &[Element],
    root: &Option<Element>,
    limits: ParseLimits,
) -> Result<(), Fb2Error> {
    if stack.is_empty() && root.is_some() {
        return Err(Fb2Error::Parse(
            "Junk after document element: second root element".into(),
        ));
    }
    if stack.len() >= limits.max_depth {
        return Err(Fb2Error::ResourceLimit {
            kind: LimitKind::Depth,
            limit: limits.max_depth,
        });
    }
    Ok(())
}

fn close_element(stack: &mut [Element], root: &mut Option<Element>, el: Element) {
    match stack.last_mut() {
        Some(parent) => parent.push_child(Node::Element(el)),
        None => *root = Some(el),
    }
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), Fb2Error> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_text(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(Fb2Error::Parse(
            "Text content outside of the root element".into(),
        )),
    }
}

fn owned_namespace(ns: ResolveResult<'_>) -> Result<Option<String>, Fb2Error> {
    match ns {
        ResolveResult::Bound(ns) => core::str::from_utf8(ns.as_ref())
            .map(|uri| Some(uri.to_string()))
            .map_err(|e| Fb2Error::Parse(format!("Namespace URI is not valid UTF-8: {}", e))),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(Fb2Error::Parse(format!(
            "Unbound namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn decode_bytes(reader: &NsReader<&[u8]>, bytes: &[u8]) -> Result<String, Fb2Error> {
    reader
        .decoder()
        .decode(bytes)
        .map(|s| s.to_string())
        .map_err(|e| Fb2Error::Parse(format!("Decode error: {}", e)))
}
