//! Unified error types for fb2_ingest
//!
//! Every stage of the pipeline reports failures through `Fb2Error`, so `?`
//! works across module boundaries and callers match on a single type.

use core::fmt;

/// Which resource ceiling a document ran into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LimitKind {
    /// Element nesting depth
    Depth,
    /// Number of candidate chapter sections
    Sections,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitKind::Depth => write!(f, "element nesting depth"),
            LimitKind::Sections => write!(f, "section count"),
        }
    }
}

/// Top-level error type for fb2_ingest operations
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Fb2Error {
    /// Malformed markup or bytes that could not be decoded
    Parse(String),
    /// Well-formed document that lacks a required element
    Structure {
        /// Local name of the missing element (`title-info` or `body`).
        missing: &'static str,
    },
    /// Document exceeds a configured resource ceiling
    ResourceLimit {
        /// Which ceiling was hit.
        kind: LimitKind,
        /// Configured maximum.
        limit: usize,
    },
}

impl Fb2Error {
    /// Name of the missing element for structure errors.
    pub fn missing_element(&self) -> Option<&'static str> {
        match self {
            Fb2Error::Structure { missing } => Some(*missing),
            _ => None,
        }
    }
}

impl fmt::Display for Fb2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fb2Error::Parse(msg) => write!(f, "Parse error: {}", msg),
            Fb2Error::Structure { missing } => {
                write!(f, "Corrupt FB2 document: missing element {}", missing)
            }
            Fb2Error::ResourceLimit { kind, limit } => {
                write!(f, "Resource limit exceeded: {} (limit: {})", kind, limit)
            }
        }
    }
}

impl std::error::Error for Fb2Error {}
