//! Error types for asset resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by asset resolution.
///
/// Missing-asset variants are only produced in strict mode; otherwise those
/// conditions are recorded in the session diagnostics and resolution yields
/// `None`.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Common library error (I/O, decompression, JSON).
    #[error("{0}")]
    Common(#[from] dazgraph_common::Error),

    /// A `#id` reference found in neither the current nor the calling file.
    #[error("missing local asset {reference} (in {scope})")]
    MissingLocalAsset { reference: String, scope: String },

    /// No library root contains the referenced file.
    #[error("file not found in any library root: {path}")]
    MissingLibraryPath { reference: String, path: String },

    /// The file was parsed but does not define the requested id.
    #[error("asset {reference} not defined in {}", file.display())]
    MissingAsset { reference: String, file: PathBuf },

    /// A reference leads back into a file that is still being loaded.
    #[error("cyclic reference {reference} (loading: {})", chain.join(" -> "))]
    CyclicReference { reference: String, chain: Vec<String> },

    /// The file parsed but its content is unusable.
    #[error("invalid file {}: {reason}", path.display())]
    InvalidFile { path: PathBuf, reason: String },
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;
