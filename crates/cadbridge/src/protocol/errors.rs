//! Error types for protocol file operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while reading or writing protocol documents.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A protocol file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A protocol file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A protocol file could not be removed.
    #[error("failed to remove {}: {source}", path.display())]
    Remove {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A document did not contain valid JSON for its schema.
    #[error("malformed {document} in {}: {source}", path.display())]
    Malformed {
        /// Document kind (`command`, `result`, `status`).
        document: &'static str,
        /// File that failed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A document could not be serialized.
    #[error("failed to encode {document}: {source}")]
    Encode {
        /// Document kind (`command`, `result`, `status`).
        document: &'static str,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Returns `true` when the error stems from unparseable content rather
    /// than the filesystem.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}
