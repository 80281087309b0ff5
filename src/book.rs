//! High-level FB2 API: bytes in, book record out.
//!
//! This module sequences the lower-level stages (tree, namespace,
//! structure check, metadata, chapters) into the single entry point
//! collaborators call. Each call is independent and returns either a
//! complete [`BookRecord`] or an [`Fb2Error`], never a partial record.

use crate::chapters::{segment_chapters, ChapterRecord, SectionSearch};
use crate::error::Fb2Error;
use crate::labels::FallbackLabels;
use crate::metadata::{extract_metadata, BookMetadata};
use crate::namespace::NamespaceContext;
use crate::tree::{parse_document, ParseLimits};
use crate::validate::{validate_fb2_with_options, validate_structure, ValidationReport};

/// Format label stored alongside ingested books.
pub const BOOK_FORMAT: &str = "FB2";

/// Per-call configuration for parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Resource ceilings for hostile or broken input.
    pub limits: ParseLimits,
    /// Localized text for missing book and chapter titles.
    pub labels: FallbackLabels,
}

impl ParseOptions {
    /// Set explicit resource limits.
    pub fn with_limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set fallback labels.
    pub fn with_labels(mut self, labels: FallbackLabels) -> Self {
        self.labels = labels;
        self
    }
}

/// Builder for ergonomic parsing with non-default options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fb2Parser {
    options: ParseOptions,
}

impl Fb2Parser {
    /// Create a parser with default limits and English labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set explicit resource limits.
    pub fn with_limits(mut self, limits: ParseLimits) -> Self {
        self.options.limits = limits;
        self
    }

    /// Set fallback labels.
    pub fn with_labels(mut self, labels: FallbackLabels) -> Self {
        self.options.labels = labels;
        self
    }

    /// Options this parser runs with.
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Parse an FB2 document.
    pub fn parse(&self, content: &[u8]) -> Result<BookRecord, Fb2Error> {
        parse_fb2_with_options(content, self.options)
    }

    /// Produce a diagnostic report without failing.
    pub fn validate(&self, content: &[u8]) -> ValidationReport {
        validate_fb2_with_options(content, self.options)
    }
}

/// A parsed book: metadata plus its ordered chapters
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BookRecord {
    metadata: BookMetadata,
    chapters: Vec<ChapterRecord>,
    source_len: usize,
}

impl BookRecord {
    /// Bibliographic metadata.
    pub fn metadata(&self) -> &BookMetadata {
        &self.metadata
    }

    /// Book title.
    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    /// Annotation text (possibly empty).
    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    /// Author display names in document order.
    pub fn authors(&self) -> &[String] {
        &self.metadata.authors
    }

    /// Space-joined genre tokens.
    pub fn genres(&self) -> &str {
        &self.metadata.genres
    }

    /// Language code.
    pub fn language(&self) -> &str {
        &self.metadata.language
    }

    /// Chapters ordered by `order`, starting at 1.
    pub fn chapters(&self) -> &[ChapterRecord] {
        &self.chapters
    }

    /// Chapter with the given 1-based `order`.
    pub fn chapter(&self, order: usize) -> Option<&ChapterRecord> {
        self.chapters.get(order.checked_sub(1)?)
    }

    /// Number of emitted chapters.
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Size of the source document in bytes.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Source format label (`"FB2"`).
    pub fn format(&self) -> &'static str {
        BOOK_FORMAT
    }

    /// Split into metadata and chapters for storage.
    pub fn into_parts(self) -> (BookMetadata, Vec<ChapterRecord>) {
        (self.metadata, self.chapters)
    }
}

/// Parse FB2 bytes with default options.
pub fn parse_fb2(content: &[u8]) -> Result<BookRecord, Fb2Error> {
    parse_fb2_with_options(content, ParseOptions::default())
}

/// Parse FB2 bytes with explicit options.
pub fn parse_fb2_with_options(
    content: &[u8],
    options: ParseOptions,
) -> Result<BookRecord, Fb2Error> {
    let root = parse_document(content, options.limits)?;
    let ctx = NamespaceContext::resolve(&root);
    log::debug!("[FB2] Namespace context: {:?}", ctx);

    validate_structure(&root, &ctx)?;
    let metadata = extract_metadata(&root, &ctx, options.labels)?;
    let segmentation = segment_chapters(&root, &ctx, options.labels, options.limits)?;

    if segmentation.search == SectionSearch::Flattened {
        log::warn!(
            "[FB2] '{}': body has no top-level sections, flattened {} nested sections",
            metadata.title,
            segmentation.candidates
        );
    }
    if segmentation.skipped > 0 {
        log::debug!(
            "[FB2] Skipped {} of {} sections without text",
            segmentation.skipped,
            segmentation.candidates
        );
    }
    log::debug!(
        "[FB2] Parsed '{}' ({} chapters, {} bytes)",
        metadata.title,
        segmentation.chapters.len(),
        content.len()
    );

    Ok(BookRecord {
        metadata,
        chapters: segmentation.chapters,
        source_len: content.len(),
    })
}
