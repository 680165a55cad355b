//! Error types for dazgraph-common.

use std::path::PathBuf;

use thiserror::Error;

/// Common error type for dazgraph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error tied to a specific file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Gzip stream could not be decoded.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file is malformed.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
