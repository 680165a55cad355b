//! Deduplicating asset store.
//!
//! Key optimizations:
//! - Assets live in one arena; lookups hand out `Copy` handles
//! - FxHashMap for O(1) lookups with fast hashing

use std::ops::Index;

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;

use dazgraph_url::NormalizedRef;

use crate::{Asset, AssetId, AssetKind, AssetRecord};

type FxHashMap<K, V> = FastHashMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Result of [`AssetStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// Stored as the primary asset for the key.
    Inserted(AssetId),
    /// The key was held by an asset of another kind; stored as a typed sibling.
    Sibling(AssetId),
    /// An asset of the same kind already holds the key. Nothing was stored.
    Duplicate(AssetId),
}

impl PutOutcome {
    /// The handle that now answers for the key and kind.
    #[inline]
    pub fn id(&self) -> AssetId {
        match *self {
            PutOutcome::Inserted(id) | PutOutcome::Sibling(id) | PutOutcome::Duplicate(id) => id,
        }
    }

    #[inline]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, PutOutcome::Duplicate(_))
    }
}

/// Mapping from normalized references to assets.
///
/// Besides the primary mapping, the store keeps, per key, the differently
/// typed assets that share that identity (a DSON id can name a node and a
/// geometry at the same time).
///
/// The store is single-writer. Callers that parse on several threads must
/// merge into the store from one thread.
#[derive(Debug, Default)]
pub struct AssetStore {
    assets: Vec<Asset>,
    by_ref: FxHashMap<NormalizedRef, AssetId>,
    siblings: FxHashMap<NormalizedRef, Vec<AssetId>>,
}

impl AssetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored assets (not keys).
    #[inline]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Number of keys in the primary mapping.
    #[inline]
    pub fn key_count(&self) -> usize {
        self.by_ref.len()
    }

    /// Look up an asset by normalized reference.
    #[inline]
    pub fn get(&self, reference: &NormalizedRef) -> Option<AssetId> {
        self.by_ref.get(reference).copied()
    }

    /// Look up an asset of a given kind.
    ///
    /// Returns the primary asset if it has the requested kind, otherwise a
    /// typed sibling sharing the key. `None` means no asset of that kind is
    /// known under the key yet.
    pub fn get_typed(&self, reference: &NormalizedRef, kind: AssetKind) -> Option<AssetId> {
        let primary = self.get(reference)?;
        if self.assets[primary.index()].kind() == kind {
            return Some(primary);
        }
        self.sibling_of_kind(reference, kind)
    }

    /// Typed siblings stored under a key.
    pub fn siblings(&self, reference: &NormalizedRef) -> &[AssetId] {
        self.siblings
            .get(reference)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check whether a key is present.
    #[inline]
    pub fn contains(&self, reference: &NormalizedRef) -> bool {
        self.by_ref.contains_key(reference)
    }

    /// Check whether a file has been parsed, by the presence of its top-level asset.
    pub fn contains_file(&self, file_ref: &NormalizedRef) -> bool {
        self.get_typed(file_ref, AssetKind::File).is_some()
    }

    /// Store a record under `reference`.
    ///
    /// The asset is also reachable under its own identity when that differs
    /// from `reference` (and is not already taken). If `reference` already
    /// names an asset of the same kind, the existing asset wins.
    pub fn put(&mut self, reference: NormalizedRef, record: AssetRecord) -> PutOutcome {
        if let Some(existing) = self.get(&reference) {
            if self.assets[existing.index()].kind() == record.kind {
                return PutOutcome::Duplicate(existing);
            }
            if let Some(sibling) = self.sibling_of_kind(&reference, record.kind) {
                return PutOutcome::Duplicate(sibling);
            }

            let identity = record.identity.clone();
            let id = self.push(record);
            self.siblings.entry(reference.clone()).or_default().push(id);
            if identity != reference && !self.by_ref.contains_key(&identity) {
                self.by_ref.insert(identity, id);
            }
            return PutOutcome::Sibling(id);
        }

        let identity = record.identity.clone();
        let id = self.push(record);
        if identity != reference {
            self.by_ref.entry(identity).or_insert(id);
        }
        self.by_ref.insert(reference, id);
        PutOutcome::Inserted(id)
    }

    /// Make an existing asset reachable under an additional key.
    ///
    /// Returns false if the key is already taken.
    pub fn alias(&mut self, reference: NormalizedRef, id: AssetId) -> bool {
        if self.by_ref.contains_key(&reference) {
            return false;
        }
        self.by_ref.insert(reference, id);
        true
    }

    /// Borrow an asset.
    #[inline]
    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(id.index())
    }

    /// Mutably borrow an asset.
    #[inline]
    pub fn asset_mut(&mut self, id: AssetId) -> Option<&mut Asset> {
        self.assets.get_mut(id.index())
    }

    /// Record a parent/child edge.
    pub fn link_child(&mut self, parent: AssetId, child: AssetId) {
        if let Some(asset) = self.assets.get_mut(parent.index()) {
            asset.push_child(child);
        }
    }

    /// Mark `instance` as an overlay of `base`.
    pub fn link_instance(&mut self, instance: AssetId, base: AssetId) {
        if let Some(asset) = self.assets.get_mut(instance.index()) {
            asset.set_instance_of(base);
        }
    }

    /// Iterate over all stored assets.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    /// Iterate over the stored assets of one kind.
    pub fn iter_kind(&self, kind: AssetKind) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(move |a| a.kind() == kind)
    }

    /// Count stored assets by kind.
    pub fn count_by_kind(&self) -> FxHashMap<AssetKind, usize> {
        let mut counts: FxHashMap<AssetKind, usize> = FxHashMap::default();
        for asset in &self.assets {
            *counts.entry(asset.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Remove every asset and key.
    pub fn clear(&mut self) {
        self.assets.clear();
        self.by_ref.clear();
        self.siblings.clear();
    }

    fn push(&mut self, record: AssetRecord) -> AssetId {
        let id = AssetId::new(self.assets.len());
        self.assets.push(Asset::from_record(id, record));
        id
    }

    fn sibling_of_kind(&self, reference: &NormalizedRef, kind: AssetKind) -> Option<AssetId> {
        self.siblings
            .get(reference)?
            .iter()
            .copied()
            .find(|id| self.assets[id.index()].kind() == kind)
    }
}

impl Index<AssetId> for AssetStore {
    type Output = Asset;

    fn index(&self, id: AssetId) -> &Asset {
        &self.assets[id.index()]
    }
}
