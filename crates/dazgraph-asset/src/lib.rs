//! Asset model and deduplicating store for DAZ content.
//!
//! Every asset parsed during an import lives in one [`AssetStore`] owned by
//! an explicit [`Session`]. The store hands out copyable [`AssetId`]
//! handles; two lookups of the same asset return the same handle, which is
//! how callers can tell they are looking at the one shared representation.
//!
//! # Example
//!
//! ```
//! use dazgraph_asset::{AssetKind, AssetPayload, AssetRecord, NodePayload, Session};
//!
//! let mut session = Session::default();
//! let file = session.normalize("/data/Genesis3Female.dsf");
//! let identity = session.normalize("/data/Genesis3Female.dsf#Genesis3Female");
//!
//! let record = AssetRecord::new(
//!     identity.clone(),
//!     AssetKind::Figure,
//!     file,
//!     AssetPayload::Node(NodePayload::default()),
//! );
//! let id = session.store_mut().put(identity.clone(), record).id();
//!
//! assert_eq!(session.store().get(&identity), Some(id));
//! assert_eq!(session.store()[id].kind(), AssetKind::Figure);
//! ```

mod asset;
mod diagnostics;
mod error;
mod payload;
mod session;
mod store;

pub use asset::{Asset, AssetId, AssetKind, AssetRecord};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{AssetError, Result};
pub use payload::{
    AssetPayload, Channel, FileInfo, GeometryPayload, ImageMap, ImagePayload, MaterialPayload,
    ModifierPayload, NodePayload, UvSetPayload,
};
pub use session::Session;
pub use store::{AssetStore, PutOutcome};

pub use dazgraph_url::{NormalizedRef, Normalizer, RefKind};
