//! Error types for library and cache I/O.

use std::path::PathBuf;

/// Errors surfaced by cache persistence. Library-walk problems degrade to
/// diagnostics instead; an unreadable library yields an empty catalog.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// Reading or writing a cache file failed.
    #[error("library cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The catalog could not be serialized.
    #[error("failed to serialize catalog cache: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}
