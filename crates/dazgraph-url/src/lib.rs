//! DAZ asset reference normalization.
//!
//! DAZ Studio refers to assets with URL-like strings such as
//! `/data/DAZ%203D/Genesis%203/Female/Genesis3Female.dsf#Genesis3Female`.
//! The same asset shows up encoded in one section of a file and raw in
//! another, with backslashes on some platforms and with inconsistent case.
//! This crate turns all of those spellings into one stable lookup key.
//!
//! # Example
//!
//! ```
//! use dazgraph_url::{Normalizer, RefKind};
//!
//! let normalizer = Normalizer::new(false);
//! let key = normalizer.normalize("My Folder/Figure!.duf");
//! assert_eq!(key.as_str(), "my%20folder/figure%21.duf");
//! assert_eq!(key.kind(), RefKind::Relative);
//!
//! let local = normalizer.normalize("#Genesis3Female");
//! assert!(local.is_local());
//! assert_eq!(local.fragment(), Some("Genesis3Female"));
//! ```

mod encode;
mod reference;

pub use encode::{denormalize, is_reserved, Normalizer};
pub use reference::{join, NormalizedRef, RefKind};
