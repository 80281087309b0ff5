//! FB2 structure validation and structured diagnostics.
//!
//! [`validate_structure`] is the hard gate the parse pipeline runs before
//! extraction. [`validate_fb2`] is a non-failing pass that reports every
//! problem it can find, including input the parser accepts but degrades.

use crate::book::ParseOptions;
use crate::chapters::{segment_chapters, SectionSearch};
use crate::error::Fb2Error;
use crate::metadata::{book_title, extract_metadata, DEFAULT_LANGUAGE};
use crate::namespace::{non_empty_text, tags, NamespaceContext, FB2_NAMESPACE};
use crate::tree::{parse_document, Element};

/// Confirm the document has a `<title-info>` and a `<body>` somewhere.
///
/// `title-info` is checked first, so a document missing both reports
/// `title-info`.
pub fn validate_structure(root: &Element, ctx: &NamespaceContext) -> Result<(), Fb2Error> {
    for required in [tags::TITLE_INFO, tags::BODY] {
        if ctx.find(root, required).is_none() {
            return Err(Fb2Error::Structure { missing: required });
        }
    }
    Ok(())
}

/// Severity level for a validation diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ValidationSeverity {
    /// The parser would reject the document.
    Error,
    /// Accepted, but some content is defaulted or dropped.
    Warning,
}

/// Structured validation diagnostic entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ValidationDiagnostic {
    /// Stable machine-readable diagnostic code.
    pub code: &'static str,
    /// Severity classification.
    pub severity: ValidationSeverity,
    /// Human-readable description.
    pub message: String,
    /// FB2 element the diagnostic is about, if any.
    pub element: Option<&'static str>,
    /// Optional remediation hint.
    pub hint: Option<String>,
}

impl ValidationDiagnostic {
    fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: ValidationSeverity::Error,
            message: message.into(),
            element: None,
            hint: None,
        }
    }

    fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: ValidationSeverity::Warning,
            message: message.into(),
            element: None,
            hint: None,
        }
    }

    fn with_element(mut self, element: &'static str) -> Self {
        self.element = Some(element);
        self
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Validation report with all discovered diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ValidationReport {
    diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return all collected diagnostics.
    pub fn diagnostics(&self) -> &[ValidationDiagnostic] {
        &self.diagnostics
    }

    /// Number of error diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == ValidationSeverity::Error)
            .count()
    }

    /// Number of warning diagnostics.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == ValidationSeverity::Warning)
            .count()
    }

    /// Returns `true` when no error-level diagnostics were found.
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    /// Whether a diagnostic with `code` was reported.
    pub fn has_code(&self, code: &str) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    fn push(&mut self, diagnostic: ValidationDiagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Validate FB2 bytes with default options.
pub fn validate_fb2(content: &[u8]) -> ValidationReport {
    validate_fb2_with_options(content, ParseOptions::default())
}

/// Validate FB2 bytes with explicit options.
///
/// The report is valid exactly when parsing with the same options succeeds.
pub fn validate_fb2_with_options(content: &[u8], options: ParseOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    let root = match parse_document(content, options.limits) {
        Ok(root) => root,
        Err(err) => {
            report.push(error_diagnostic(&err));
            return report;
        }
    };

    let ctx = NamespaceContext::resolve(&root);
    match ctx.uri() {
        None => report.push(
            ValidationDiagnostic::warning(
                "FB2_NAMESPACE_MISSING",
                "Root element is not namespace-qualified.",
            )
            .with_hint(format!("Declare xmlns=\"{}\" on the root.", FB2_NAMESPACE)),
        ),
        Some(uri) if uri != FB2_NAMESPACE => report.push(ValidationDiagnostic::warning(
            "FB2_NAMESPACE_NONSTANDARD",
            format!("Root namespace '{}' is not the FictionBook 2.0 namespace.", uri),
        )),
        Some(_) => {}
    }

    let mut structure_ok = true;
    for required in [tags::TITLE_INFO, tags::BODY] {
        if ctx.find(&root, required).is_none() {
            structure_ok = false;
            report.push(error_diagnostic(&Fb2Error::Structure { missing: required }));
        }
    }
    if !structure_ok {
        return report;
    }

    if let Some(title_info) = ctx.find(&root, tags::TITLE_INFO) {
        check_title_info(title_info, &root, &ctx, options, &mut report);
    }

    match segment_chapters(&root, &ctx, options.labels, options.limits) {
        Ok(seg) => {
            if seg.search == SectionSearch::Flattened {
                report.push(
                    ValidationDiagnostic::warning(
                        "FB2_SECTIONS_FLATTENED",
                        format!(
                            "Body has no top-level sections; {} nested sections were flattened into chapters.",
                            seg.candidates
                        ),
                    )
                    .with_element(tags::SECTION),
                );
            }
            if seg.skipped > 0 {
                report.push(
                    ValidationDiagnostic::warning(
                        "FB2_EMPTY_SECTIONS_SKIPPED",
                        format!(
                            "{} of {} sections have no paragraph text and were skipped.",
                            seg.skipped, seg.candidates
                        ),
                    )
                    .with_element(tags::SECTION),
                );
            }
            if seg.chapters.is_empty() {
                report.push(
                    ValidationDiagnostic::warning(
                        "FB2_NO_CHAPTERS",
                        "Document produces no chapters.",
                    )
                    .with_element(tags::BODY)
                    .with_hint("Wrap body text in <section> elements with <p> paragraphs."),
                );
            }
        }
        Err(err) => report.push(error_diagnostic(&err)),
    }

    report
}

fn check_title_info(
    title_info: &Element,
    root: &Element,
    ctx: &NamespaceContext,
    options: ParseOptions,
    report: &mut ValidationReport,
) {
    if book_title(title_info, ctx).is_none() {
        report.push(
            ValidationDiagnostic::warning(
                "FB2_BOOK_TITLE_MISSING",
                format!(
                    "No <book-title>; the title defaults to '{}'.",
                    options.labels.untitled
                ),
            )
            .with_element(tags::BOOK_TITLE),
        );
    }

    let has_author = extract_metadata(root, ctx, options.labels)
        .map(|metadata| !metadata.authors.is_empty())
        .unwrap_or(false);
    if !has_author {
        report.push(
            ValidationDiagnostic::warning("FB2_AUTHOR_MISSING", "No author with a usable name.")
                .with_element(tags::AUTHOR),
        );
    }

    if ctx
        .child(title_info, tags::LANG)
        .and_then(non_empty_text)
        .is_none()
    {
        report.push(
            ValidationDiagnostic::warning(
                "FB2_LANG_MISSING",
                format!("No <lang>; the language defaults to '{}'.", DEFAULT_LANGUAGE),
            )
            .with_element(tags::LANG),
        );
    }
}

fn error_diagnostic(err: &Fb2Error) -> ValidationDiagnostic {
    match err {
        Fb2Error::Parse(_) => ValidationDiagnostic::error("FB2_XML_MALFORMED", err.to_string()),
        Fb2Error::Structure { missing } => {
            let code = if *missing == tags::TITLE_INFO {
                "FB2_TITLE_INFO_MISSING"
            } else {
                "FB2_BODY_MISSING"
            };
            ValidationDiagnostic::error(code, err.to_string()).with_element(*missing)
        }
        Fb2Error::ResourceLimit { .. } => {
            ValidationDiagnostic::error("FB2_RESOURCE_LIMIT", err.to_string())
        }
    }
}
