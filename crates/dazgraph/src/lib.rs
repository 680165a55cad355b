//! dazgraph - DAZ Studio asset resolution and deduplication library.
//!
//! This crate provides a unified interface to the dazgraph crates for
//! reading DSON content and building a per-session graph of assets in
//! which every unique asset is represented once.
//!
//! # Crates
//!
//! - [`dazgraph_common`] - Settings, errors and gzip-aware DSON reading
//! - [`dazgraph_url`] - Reference normalization and joining
//! - [`dazgraph_asset`] - Assets, payloads, the asset store and sessions
//! - [`dazgraph_resolver`] - Lazy cross-file resolution
//!
//! # Example
//!
//! ```no_run
//! use dazgraph::prelude::*;
//!
//! let settings = Settings::load("settings.json")?;
//! let mut session = Session::new(settings.clone());
//! let mut resolver = Resolver::new(LibraryPaths::from_settings(&settings), DsonParser::new());
//!
//! resolver.load_file(&mut session, "Scenes/Victoria.duf".as_ref())?;
//! for (kind, count) in session.store().count_by_kind() {
//!     println!("{}: {}", kind, count);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use dazgraph_asset as asset;
pub use dazgraph_common as common;
pub use dazgraph_resolver as resolver;
pub use dazgraph_url as url;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use dazgraph_asset::{
        Asset, AssetError, AssetId, AssetKind, AssetPayload, AssetStore, Diagnostic, Session,
    };
    pub use dazgraph_common::{Settings, Verbosity};
    pub use dazgraph_resolver::{DsonParser, FileParser, FileScope, LibraryPaths, PathResolver, Resolver};
    pub use dazgraph_url::{denormalize, join, NormalizedRef, Normalizer, RefKind};

    #[cfg(feature = "parallel")]
    pub use dazgraph_resolver::PreloadStats;
}

// Re-export commonly used types at the crate root
pub use dazgraph_asset::Session;
pub use dazgraph_resolver::Resolver;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
