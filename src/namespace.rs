//! Document-level namespace resolution and tag lookups
//!
//! FB2 documents are either fully qualified with the FictionBook namespace
//! or not qualified at all. The choice is read once from the root element
//! and every lookup afterwards goes through the resulting
//! [`NamespaceContext`].

use crate::tree::Element;

/// Namespace URI defined by the FictionBook 2.0 schema.
pub const FB2_NAMESPACE: &str = "http://www.gribuser.ru/xml/fictionbook/2.0";

/// FB2 element names used by the pipeline.
pub mod tags {
    /// Bibliographic description of the book itself
    pub const TITLE_INFO: &str = "title-info";
    /// Main text container
    pub const BODY: &str = "body";
    /// Structural unit inside a body
    pub const SECTION: &str = "section";
    /// Section or body heading
    pub const TITLE: &str = "title";
    /// Paragraph
    pub const P: &str = "p";
    /// Book title inside title-info
    pub const BOOK_TITLE: &str = "book-title";
    /// Author entry
    pub const AUTHOR: &str = "author";
    /// Author given name
    pub const FIRST_NAME: &str = "first-name";
    /// Author middle name
    pub const MIDDLE_NAME: &str = "middle-name";
    /// Author family name
    pub const LAST_NAME: &str = "last-name";
    /// Book annotation (blurb)
    pub const ANNOTATION: &str = "annotation";
    /// Genre token
    pub const GENRE: &str = "genre";
    /// Book language code
    pub const LANG: &str = "lang";
}

/// Namespace every element of one document is looked up in
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NamespaceContext {
    /// Root element is qualified; all lookups require this URI
    Namespaced(String),
    /// Root element is unqualified; lookups use bare names
    Bare,
}

impl NamespaceContext {
    /// Resolve the context from the document root.
    pub fn resolve(root: &Element) -> Self {
        match root.namespace() {
            Some(uri) => NamespaceContext::Namespaced(uri.to_string()),
            None => NamespaceContext::Bare,
        }
    }

    /// Namespace URI lookups match against, if any.
    pub fn uri(&self) -> Option<&str> {
        match self {
            NamespaceContext::Namespaced(uri) => Some(uri),
            NamespaceContext::Bare => None,
        }
    }

    /// Whether the context uses the standard FictionBook namespace.
    pub fn is_standard(&self) -> bool {
        self.uri() == Some(FB2_NAMESPACE)
    }

    /// Check whether `el` is the tag `local` in this context.
    pub fn is(&self, el: &Element, local: &str) -> bool {
        el.name() == local && el.namespace() == self.uri()
    }

    /// First direct child named `local`.
    pub fn child<'a>(&self, parent: &'a Element, local: &str) -> Option<&'a Element> {
        parent.child_elements().find(|el| self.is(el, local))
    }

    /// All direct children named `local`, in document order.
    pub fn children<'a>(
        &'a self,
        parent: &'a Element,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        parent.child_elements().filter(move |el| self.is(el, local))
    }

    /// First descendant named `local` (document order).
    pub fn find<'a>(&self, scope: &'a Element, local: &str) -> Option<&'a Element> {
        scope.descendants().find(|el| self.is(el, local))
    }

    /// All descendants named `local`, in document order.
    pub fn find_all<'a>(
        &'a self,
        scope: &'a Element,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        scope.descendants().filter(move |el| self.is(el, local))
    }
}

/// Trimmed text content of an element, `None` when it is blank.
pub(crate) fn non_empty_text(el: &Element) -> Option<String> {
    let text = el.text_content();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
