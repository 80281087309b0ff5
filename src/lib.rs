//! fb2_ingest -- FB2 (FictionBook) ingestion pipeline
//!
//! Turns the raw bytes of an FB2 document into a [`BookRecord`]: title,
//! description, authors, genres and language from `<title-info>`, plus an
//! ordered list of [`ChapterRecord`]s derived from the body sections.
//!
//! ```rust
//! use fb2_ingest::parse_fb2;
//!
//! let xml = br#"<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0">
//!   <description><title-info><book-title>Sample</book-title></title-info></description>
//!   <body><section><title><p>Intro</p></title><p>Hello world.</p></section></body>
//! </FictionBook>"#;
//!
//! let book = parse_fb2(xml).unwrap();
//! assert_eq!(book.title(), "Sample");
//! assert_eq!(book.chapters()[0].title, "Intro");
//! ```
//!
//! # Features
//!
//! - `encoding` (default) -- honor the XML declaration encoding
//!   (e.g. `windows-1251`)
//! - `serde` -- `Serialize`/`Deserialize` for records and reports
//! - `cli` -- the `fb2-ingest` inspection binary
//!
//! The pipeline is synchronous, holds no state between calls and performs no
//! I/O; nesting depth and section count are bounded by [`ParseLimits`].

#![warn(missing_docs)]
#![deny(clippy::large_enum_variant, clippy::redundant_clone)]
#![warn(
    clippy::needless_collect,
    clippy::map_clone,
    clippy::implicit_clone,
    clippy::inefficient_to_string
)]

pub mod book;
pub mod chapters;
pub mod error;
pub mod labels;
pub mod metadata;
pub mod namespace;
pub mod tree;
pub mod validate;

// Re-export key types for convenience
pub use book::{
    parse_fb2, parse_fb2_with_options, BookRecord, Fb2Parser, ParseOptions, BOOK_FORMAT,
};
pub use chapters::{segment_chapters, ChapterRecord, SectionSearch, Segmentation};
pub use error::{Fb2Error, LimitKind};
pub use labels::FallbackLabels;
pub use metadata::{extract_metadata, BookMetadata, DEFAULT_LANGUAGE};
pub use namespace::{NamespaceContext, FB2_NAMESPACE};
pub use tree::{parse_document, Element, Node, ParseLimits};
pub use validate::{
    validate_fb2, validate_fb2_with_options, validate_structure, ValidationDiagnostic,
    ValidationReport, ValidationSeverity,
};
