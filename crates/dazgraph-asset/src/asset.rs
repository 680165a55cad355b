//! Asset nodes.

use std::fmt;

use dazgraph_url::NormalizedRef;

use crate::AssetPayload;

/// Handle to an asset inside a [`crate::AssetStore`].
///
/// Handles are only meaningful for the store that produced them and become
/// stale when the store is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u32);

impl AssetId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the asset in its store.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type tag of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    /// The top-level record of a parsed file.
    File,
    Figure,
    Bone,
    Node,
    Geometry,
    UvSet,
    Material,
    Modifier,
    Image,
    Other,
}

impl AssetKind {
    /// Kind for a `node_library` entry, from its DSON `type` field.
    pub fn from_node_type(node_type: Option<&str>) -> Self {
        match node_type {
            Some("figure") => AssetKind::Figure,
            Some("bone") => AssetKind::Bone,
            _ => AssetKind::Node,
        }
    }

    /// Whether this kind is one of the node kinds.
    #[inline]
    pub fn is_node(&self) -> bool {
        matches!(self, AssetKind::Figure | AssetKind::Bone | AssetKind::Node)
    }

    /// Lower-case display name.
    pub fn name(&self) -> &'static str {
        match self {
            AssetKind::File => "file",
            AssetKind::Figure => "figure",
            AssetKind::Bone => "bone",
            AssetKind::Node => "node",
            AssetKind::Geometry => "geometry",
            AssetKind::UvSet => "uv_set",
            AssetKind::Material => "material",
            AssetKind::Modifier => "modifier",
            AssetKind::Image => "image",
            AssetKind::Other => "other",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed asset that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    /// Canonical self-id: `file#id`, or the file path for file records.
    pub identity: NormalizedRef,
    pub kind: AssetKind,
    /// File the record was read from.
    pub file: NormalizedRef,
    /// Parent reference, already qualified against `file`.
    pub parent: Option<NormalizedRef>,
    pub payload: AssetPayload,
}

impl AssetRecord {
    /// Create a record without a parent.
    pub fn new(
        identity: NormalizedRef,
        kind: AssetKind,
        file: NormalizedRef,
        payload: AssetPayload,
    ) -> Self {
        Self {
            identity,
            kind,
            file,
            parent: None,
            payload,
        }
    }

    /// Set the parent reference.
    pub fn with_parent(mut self, parent: Option<NormalizedRef>) -> Self {
        self.parent = parent;
        self
    }
}

/// An asset owned by the store.
///
/// The identity, kind and source file are fixed at insertion. The payload
/// can be updated through [`Asset::merge`] or [`Asset::payload_mut`].
#[derive(Debug, Clone)]
pub struct Asset {
    id: AssetId,
    identity: NormalizedRef,
    kind: AssetKind,
    file: NormalizedRef,
    parent: Option<NormalizedRef>,
    children: Vec<AssetId>,
    instance_of: Option<AssetId>,
    payload: AssetPayload,
}

impl Asset {
    pub(crate) fn from_record(id: AssetId, record: AssetRecord) -> Self {
        Self {
            id,
            identity: record.identity,
            kind: record.kind,
            file: record.file,
            parent: record.parent,
            children: Vec::new(),
            instance_of: None,
            payload: record.payload,
        }
    }

    #[inline]
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Canonical self-id.
    #[inline]
    pub fn identity(&self) -> &NormalizedRef {
        &self.identity
    }

    #[inline]
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// File the asset was read from.
    #[inline]
    pub fn file(&self) -> &NormalizedRef {
        &self.file
    }

    #[inline]
    pub fn parent(&self) -> Option<&NormalizedRef> {
        self.parent.as_ref()
    }

    #[inline]
    pub fn children(&self) -> &[AssetId] {
        &self.children
    }

    /// The library asset this asset overlays, for instance assets.
    #[inline]
    pub fn instance_of(&self) -> Option<AssetId> {
        self.instance_of
    }

    #[inline]
    pub fn payload(&self) -> &AssetPayload {
        &self.payload
    }

    #[inline]
    pub fn payload_mut(&mut self) -> &mut AssetPayload {
        &mut self.payload
    }

    /// Display name from the payload, falling back to the fragment id.
    pub fn name(&self) -> Option<&str> {
        self.payload.name().or_else(|| self.identity.fragment())
    }

    /// Merge overlay values into the payload.
    ///
    /// Returns false, leaving the payload untouched, if the overlay is of a
    /// different payload type.
    pub fn merge(&mut self, overlay: &AssetPayload) -> bool {
        self.payload.merge(overlay)
    }

    pub(crate) fn push_child(&mut self, child: AssetId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn set_instance_of(&mut self, base: AssetId) {
        self.instance_of = Some(base);
    }
}
