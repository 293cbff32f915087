//! Error types for composing and updating composite skills.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout `lego-core`.
pub type Result<T, E = LegoError> = std::result::Result<T, E>;

/// Every failure aborts the whole compose/update run.
#[derive(Debug, Error)]
pub enum LegoError {
    /// A skill identifier could not be parsed.
    #[error("cannot resolve skill identifier '{input}': {reason}")]
    Resolution { input: String, reason: String },

    /// The source fetcher failed (after the branch fallback, if any).
    #[error("failed to fetch {source_url}: {message}")]
    Fetch { source_url: String, message: String },

    /// No `SKILL.md` was found where the identifier points.
    #[error("no SKILL.md found {location}")]
    ManifestMissing { location: String },

    /// The composite has no `SOURCES.md` to update from.
    #[error("no SOURCES.md found in {}", .0.display())]
    LedgerMissing(PathBuf),

    /// The ledger names no skill identifiers.
    #[error("no skill identifiers found in {}", .0.display())]
    NoIdentifiersFound(PathBuf),

    /// Two identifiers would be placed in the same skill directory.
    #[error("skill name '{name}' is claimed by both '{first}' and '{second}'")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip archive failure while packaging.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The sources lock could not be read or written.
    #[error("sources lock error: {0}")]
    Lock(#[from] serde_json::Error),
}

impl LegoError {
    pub(crate) fn resolution(input: &str, reason: impl Into<String>) -> Self {
        Self::Resolution {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn fetch(source_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            source_url: source_url.into(),
            message: message.into(),
        }
    }
}
