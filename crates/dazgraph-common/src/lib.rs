//! Common utilities for dazgraph.
//!
//! This crate provides the pieces shared by every dazgraph crate:
//!
//! - [`read_dson`] - Read a DSON file (`.duf`/`.dsf`), gzipped or plain
//! - [`Settings`] - Session settings (library roots, case policy, strictness)
//! - [`Error`] - Common error type

mod dson;
mod error;
mod settings;

pub use dson::{decompress_gzip, is_gzip, read_dson, read_dson_bytes, GZIP_MAGIC};
pub use error::{Error, Result};
pub use settings::{Settings, Verbosity};
