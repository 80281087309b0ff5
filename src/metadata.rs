//! FB2 bibliographic metadata extraction
//!
//! Reads the first `<title-info>` block: book title, authors, annotation,
//! genres and language. Every field is optional in practice, so absence
//! yields a default value instead of an error.

use crate::error::Fb2Error;
use crate::labels::FallbackLabels;
use crate::namespace::{non_empty_text, tags, NamespaceContext};
use crate::tree::Element;

/// Language code used when the document has no `<lang>`.
pub const DEFAULT_LANGUAGE: &str = "ru";

/// Separator used when authors are stored as one text field.
pub const AUTHOR_SEPARATOR: &str = ", ";

/// Book metadata extracted from `<title-info>`
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BookMetadata {
    /// Book title (localized fallback when absent)
    pub title: String,
    /// Annotation text, empty when absent
    pub description: String,
    /// Author display names in document order
    pub authors: Vec<String>,
    /// Genre tokens joined by single spaces
    pub genres: String,
    /// Language code (e.g. "ru")
    pub language: String,
}

impl BookMetadata {
    /// Authors joined into a single storage field (`"A, B"`).
    pub fn authors_joined(&self) -> String {
        self.authors.join(AUTHOR_SEPARATOR)
    }

    /// Iterate the individual genre tokens.
    pub fn genre_tokens(&self) -> impl Iterator<Item = &str> {
        self.genres.split_whitespace()
    }
}

/// Extract metadata from the first `<title-info>` element of a document.
///
/// Fails only when the document has no `<title-info>` at all.
pub fn extract_metadata(
    root: &Element,
    ctx: &NamespaceContext,
    labels: FallbackLabels,
) -> Result<BookMetadata, Fb2Error> {
    let title_info = ctx
        .find(root, tags::TITLE_INFO)
        .ok_or(Fb2Error::Structure {
            missing: tags::TITLE_INFO,
        })?;

    let title = book_title(title_info, ctx).unwrap_or_else(|| labels.untitled.to_string());

    let authors = ctx
        .children(title_info, tags::AUTHOR)
        .filter_map(|author| author_name(author, ctx))
        .collect();

    let description = ctx
        .find(title_info, tags::ANNOTATION)
        .map(|annotation| annotation_text(annotation, ctx))
        .unwrap_or_default();

    let genres = ctx
        .find_all(title_info, tags::GENRE)
        .filter_map(non_empty_text)
        .collect::<Vec<_>>()
        .join(" ");

    let language = ctx
        .child(title_info, tags::LANG)
        .and_then(non_empty_text)
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    Ok(BookMetadata {
        title,
        description,
        authors,
        genres,
        language,
    })
}

/// First `<book-title>` child with non-blank text.
pub(crate) fn book_title(title_info: &Element, ctx: &NamespaceContext) -> Option<String> {
    ctx.children(title_info, tags::BOOK_TITLE)
        .find_map(non_empty_text)
}

/// "First Middle Last" with blank parts skipped; `None` when all are blank.
fn author_name(author: &Element, ctx: &NamespaceContext) -> Option<String> {
    let name = [tags::FIRST_NAME, tags::MIDDLE_NAME, tags::LAST_NAME]
        .iter()
        .filter_map(|part| ctx.child(author, part).and_then(non_empty_text))
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Paragraphs joined by newlines, or the whole annotation text when it has
/// no paragraphs.
fn annotation_text(annotation: &Element, ctx: &NamespaceContext) -> String {
    let paragraphs: Vec<&Element> = ctx.find_all(annotation, tags::P).collect();
    if paragraphs.is_empty() {
        return annotation.text_content().trim().to_string();
    }
    paragraphs
        .into_iter()
        .filter_map(non_empty_text)
        .collect::<Vec<_>>()
        .join("\n")
}
