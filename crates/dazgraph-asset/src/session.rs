//! Import session.

use dazgraph_common::{Settings, Verbosity};
use dazgraph_url::{NormalizedRef, Normalizer};
use log::debug;

use crate::{Asset, AssetId, AssetStore, Diagnostic, Diagnostics};

/// State for one import: settings, the asset store and the diagnostics log.
///
/// Nothing here is global; every import (and every test) owns its session.
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    normalizer: Normalizer,
    store: AssetStore,
    diagnostics: Diagnostics,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Session {
    /// Start an empty session.
    pub fn new(settings: Settings) -> Self {
        Self {
            normalizer: Normalizer::new(settings.case_sensitive_paths),
            settings,
            store: AssetStore::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Normalize a reference under this session's case policy.
    #[inline]
    pub fn normalize(&self, reference: &str) -> NormalizedRef {
        self.normalizer.normalize(reference)
    }

    #[inline]
    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    #[inline]
    pub fn store_mut(&mut self) -> &mut AssetStore {
        &mut self.store
    }

    /// Borrow an asset by handle.
    #[inline]
    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.store.asset(id)
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Record a recoverable condition.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        let verbosity: Verbosity = self.settings.verbosity;
        self.diagnostics.record(diagnostic, verbosity);
    }

    /// Whether any asset was reported missing so far.
    #[inline]
    pub fn some_assets_missing(&self) -> bool {
        self.diagnostics.some_assets_missing()
    }

    /// Drop all assets and diagnostics.
    pub fn clear(&mut self) {
        debug!("clearing session ({} assets)", self.store.len());
        self.store.clear();
        self.diagnostics.clear();
    }

    /// End the import: return the missing-asset notice, then clear.
    pub fn finish(&mut self) -> Option<String> {
        let summary = self.diagnostics.summary();
        self.clear();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssetKind, AssetPayload, AssetRecord, ImagePayload};

    #[test]
    fn test_session_normalizes_with_settings() {
        let session = Session::new(Settings {
            case_sensitive_paths: false,
            ..Settings::default()
        });
        assert_eq!(session.normalize("/Data/A B.dsf#Id").as_str(), "/data/a%20b.dsf#Id");
    }

    #[test]
    fn test_finish_clears() {
        let mut session = Session::default();
        let key = session.normalize("/data/a.dsf#img");
        let record = AssetRecord::new(
            key.clone(),
            AssetKind::Image,
            key.file_ref(),
            AssetPayload::Image(ImagePayload::default()),
        );
        session.store_mut().put(key.clone(), record);
        session.report(Diagnostic::MissingLocalAsset {
            reference: "#x".into(),
            scope: "/data/a.dsf".into(),
        });

        let summary = session.finish();
        assert!(summary.is_some());
        assert_eq!(session.store().get(&key), None);
        assert!(!session.some_assets_missing());
        assert_eq!(session.finish(), None);
    }
}
