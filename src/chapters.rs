//! Chapter segmentation of the FB2 `<body>`
//!
//! Sections become chapters. Only direct child sections of the body are
//! considered first; when a body has none, every nested section is taken
//! instead and the hierarchy is flattened into one list. Each section
//! contributes its own direct paragraphs only, and sections without text
//! are dropped while orders stay gapless.

use crate::error::{Fb2Error, LimitKind};
use crate::labels::FallbackLabels;
use crate::namespace::{non_empty_text, tags, NamespaceContext};
use crate::tree::{Element, ParseLimits};

/// Separator placed between paragraphs of chapter content.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// One chapter emitted from a body section
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChapterRecord {
    /// 1-based rank among emitted chapters (gapless)
    pub order: usize,
    /// Section title or a generated "Chapter N" label
    pub title: String,
    /// Paragraph text separated by blank lines, never empty
    pub content: String,
}

/// How candidate sections were discovered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectionSearch {
    /// Direct `<section>` children of the body
    TopLevel,
    /// Body had no direct sections; all nested sections were taken and the
    /// nesting discarded
    Flattened,
}

/// Result of segmenting a body into chapters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segmentation {
    /// Emitted chapters in document order
    pub chapters: Vec<ChapterRecord>,
    /// Which search tier produced the candidates
    pub search: SectionSearch,
    /// Number of candidate sections found
    pub candidates: usize,
    /// Candidates dropped because they had no paragraph text
    pub skipped: usize,
}

/// Split the first `<body>` of a document into chapters.
pub fn segment_chapters(
    root: &Element,
    ctx: &NamespaceContext,
    labels: FallbackLabels,
    limits: ParseLimits,
) -> Result<Segmentation, Fb2Error> {
    let body = ctx
        .find(root, tags::BODY)
        .ok_or(Fb2Error::Structure { missing: tags::BODY })?;

    let mut search = SectionSearch::TopLevel;
    let mut sections = collect_sections(ctx.children(body, tags::SECTION), limits)?;
    if sections.is_empty() {
        sections = collect_sections(ctx.find_all(body, tags::SECTION), limits)?;
        if !sections.is_empty() {
            search = SectionSearch::Flattened;
        }
    }

    let mut chapters = Vec::with_capacity(sections.len());
    let mut skipped = 0;
    for (idx, section) in sections.iter().enumerate() {
        // Fallback numbering counts every candidate, including dropped ones
        let position = idx + 1;
        let content = section_content(section, ctx);
        if content.is_empty() {
            log::debug!("[FB2] Section {} has no paragraph text, skipping", position);
            skipped += 1;
            continue;
        }
        let title = section_title(section, ctx).unwrap_or_else(|| labels.chapter_title(position));
        chapters.push(ChapterRecord {
            order: chapters.len() + 1,
            title,
            content,
        });
    }

    Ok(Segmentation {
        chapters,
        search,
        candidates: sections.len(),
        skipped,
    })
}

fn collect_sections<'a>(
    sections: impl Iterator<Item = &'a Element>,
    limits: ParseLimits,
) -> Result<Vec<&'a Element>, Fb2Error> {
    let found: Vec<&Element> = sections.take(limits.max_sections.saturating_add(1)).collect();
    if found.len() > limits.max_sections {
        return Err(Fb2Error::ResourceLimit {
            kind: LimitKind::Sections,
            limit: limits.max_sections,
        });
    }
    Ok(found)
}

/// Text of the direct `<title>` child: its paragraphs joined by spaces, or
/// its whole text when it has none.
fn section_title(section: &Element, ctx: &NamespaceContext) -> Option<String> {
    let title = ctx.child(section, tags::TITLE)?;
    let paragraphs: Vec<&Element> = ctx.find_all(title, tags::P).collect();
    if paragraphs.is_empty() {
        return non_empty_text(title);
    }
    let joined = paragraphs
        .into_iter()
        .filter_map(non_empty_text)
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Direct `<p>` children only; nested sections are separate candidates.
fn section_content(section: &Element, ctx: &NamespaceContext) -> String {
    ctx.children(section, tags::P)
        .filter_map(non_empty_text)
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR)
}
