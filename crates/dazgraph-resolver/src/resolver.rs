//! Reference resolution across files.

use std::path::{Path, PathBuf};

use dazgraph_asset::{
    AssetError, AssetId, AssetKind, AssetPayload, AssetRecord, AssetStore, Diagnostic, PutOutcome,
    Result, Session,
};
use dazgraph_url::{denormalize, join, NormalizedRef};
use log::{debug, info};

use crate::parser::{FileParser, InstanceLink, ParsedFile};
use crate::paths::PathResolver;
use crate::scope::FileScope;

/// Resolves references to assets, loading the files that define them on
/// first use.
///
/// Every file is parsed at most once per session. A reference into a file
/// that is still being loaded further up the call chain, and does not name
/// an asset that file has already registered, is recorded as missing. In
/// strict mode it fails with [`AssetError::CyclicReference`] instead.
pub struct Resolver<P, F> {
    paths: P,
    parser: F,
    /// Files whose instance links are being processed, outermost first.
    loading: Vec<NormalizedRef>,
}

impl<P: PathResolver, F: FileParser> Resolver<P, F> {
    pub fn new(paths: P, parser: F) -> Self {
        Self {
            paths,
            parser,
            loading: Vec::new(),
        }
    }

    #[inline]
    pub fn paths(&self) -> &P {
        &self.paths
    }

    #[inline]
    pub fn parser(&self) -> &F {
        &self.parser
    }

    /// Resolve `reference`, read in the file of `scope`, to an asset.
    ///
    /// Returns `Ok(None)` for channel references (`...?channel`) and, unless
    /// `strict` is set, for anything that cannot be found. Missing assets are
    /// always recorded in the session diagnostics.
    pub fn resolve(
        &mut self,
        session: &mut Session,
        reference: &str,
        scope: &FileScope<'_>,
        strict: bool,
    ) -> Result<Option<AssetId>> {
        let normalized = session.normalize(reference);
        if normalized.is_empty() || normalized.is_channel() {
            return Ok(None);
        }

        let key = join(scope.file(), &normalized);
        if let Some(id) = session.store().get(&key) {
            return Ok(Some(id));
        }

        if normalized.is_local() {
            self.resolve_local(session, key, &normalized, scope, strict)
        } else {
            self.resolve_external(session, key, scope, strict)
        }
    }

    /// Resolve `reference` to an asset of `kind`.
    ///
    /// When the reference names an asset of another kind, a typed sibling
    /// registered under the same key is returned instead. [`AssetKind::Node`]
    /// matches every node kind.
    pub fn resolve_typed(
        &mut self,
        session: &mut Session,
        reference: &str,
        kind: AssetKind,
        scope: &FileScope<'_>,
        strict: bool,
    ) -> Result<Option<AssetId>> {
        let Some(id) = self.resolve(session, reference, scope, strict)? else {
            return Ok(None);
        };
        if kind_matches(kind, session.store()[id].kind()) {
            return Ok(Some(id));
        }

        let key = join(scope.file(), &session.normalize(reference));
        if let Some(sibling) = typed_sibling(session.store(), &key, kind) {
            return Ok(Some(sibling));
        }

        let file_ref = key.file_ref();
        if !session.store().contains_file(&file_ref) && !self.loading.contains(&file_ref) {
            self.load_ref(session, &file_ref, &key, Some(scope), strict)?;
            if let Some(sibling) = typed_sibling(session.store(), &key, kind) {
                return Ok(Some(sibling));
            }
        }

        debug!("{} is a {}, not a {}", key, session.store()[id].kind(), kind);
        Ok(None)
    }

    /// Resolve the shared asset an instance link points at and store the
    /// link's overlay as a new asset under `scope.file#link.id`.
    ///
    /// If that identity is already taken by an asset of the same kind, the
    /// existing asset is returned; a differing overlay is reported as a
    /// duplicate definition.
    pub fn parse_url_asset_link(
        &mut self,
        session: &mut Session,
        link: &InstanceLink,
        scope: &FileScope<'_>,
    ) -> Result<Option<AssetId>> {
        let strict = session.settings().strict;
        let base = match link.kind {
            Some(kind) => self.resolve_typed(session, &link.url, kind, scope, strict)?,
            None => self.resolve(session, &link.url, scope, strict)?,
        };
        let Some(base) = base else {
            return Ok(None);
        };

        let url = session.normalize(&link.url);
        let Some(local_id) = link.id.as_deref().or(url.fragment()) else {
            return Ok(Some(base));
        };
        let identity = scope.file().with_fragment(session.normalizer(), local_id);

        let base_asset = &session.store()[base];
        if *base_asset.identity() == identity {
            return Ok(Some(base));
        }
        let kind = base_asset.kind();
        let mut payload = base_asset.payload().clone();
        if !payload.merge(&link.overlay) {
            debug!("{}: overlay does not apply to a {}", identity, kind);
        }

        if let Some(existing) = existing_definition(session, &identity, kind, &payload) {
            return Ok(Some(existing));
        }

        let parent = link
            .parent
            .as_deref()
            .map(|p| join(scope.file(), &session.normalize(p)));
        let record = AssetRecord::new(identity.clone(), kind, scope.file().clone(), payload)
            .with_parent(parent.clone());

        let store = session.store_mut();
        let id = store.put(identity, record).id();
        store.link_instance(id, base);

        let owner = parent
            .as_ref()
            .and_then(|p| find_parent(store, p, kind))
            .or_else(|| store.get_typed(scope.file(), AssetKind::File));
        if let Some(owner) = owner {
            store.link_child(owner, id);
        }

        Ok(Some(id))
    }

    /// Import a file from disk, typically the scene an import starts from.
    ///
    /// Returns the file's top-level asset. Files already loaded are not
    /// parsed again.
    pub fn load_file(&mut self, session: &mut Session, path: &Path) -> Result<AssetId> {
        let file_ref = self.file_ref_for(session, path);
        if let Some(id) = session.store().get_typed(&file_ref, AssetKind::File) {
            debug!("{} already loaded", file_ref);
            return Ok(id);
        }

        self.load_path(session, path, &file_ref, None)
    }

    /// The key a file on disk is registered under: its library-relative path
    /// when it lies in a library, the full path otherwise.
    pub fn file_ref_for(&self, session: &Session, path: &Path) -> NormalizedRef {
        match self.paths.library_relative(path) {
            Some(relative) => session.normalize(&relative),
            None => session.normalize(&path.to_string_lossy()),
        }
    }

    /// Store everything a parsed file defines, then process its instance
    /// links with the file as scope and `caller` above it.
    pub fn register(
        &mut self,
        session: &mut Session,
        parsed: ParsedFile,
        caller: Option<&FileScope<'_>>,
    ) -> Result<AssetId> {
        let ParsedFile {
            path,
            file_ref,
            declared_id,
            file_record,
            assets,
            instances,
        } = parsed;

        if let Some(existing) = session.store().get_typed(&file_ref, AssetKind::File) {
            debug!("{} already loaded", file_ref);
            return Ok(existing);
        }
        info!("loading {}", path.display());

        let file_id = session.store_mut().put(file_ref.clone(), file_record).id();
        if let Some(declared) = &declared_id {
            session.store_mut().alias(declared.clone(), file_id);
        }

        let mut stored = Vec::with_capacity(assets.len());
        for record in assets {
            let identity = record.identity.clone();
            if existing_definition(session, &identity, record.kind, &record.payload).is_some() {
                continue;
            }

            let outcome = session.store_mut().put(identity.clone(), record);
            if let (PutOutcome::Inserted(id), Some(declared), Some(fragment)) =
                (outcome, &declared_id, identity.fragment())
            {
                let alias = session.normalize(&format!("{}#{}", declared.path(), fragment));
                session.store_mut().alias(alias, id);
            }
            stored.push(outcome.id());
        }

        let store = session.store_mut();
        for id in stored {
            let asset = &store[id];
            let owner = match asset.parent() {
                Some(parent) => find_parent(store, parent, asset.kind()),
                None => Some(file_id),
            };
            match owner {
                Some(owner) => store.link_child(owner, id),
                None => debug!("{}: parent not loaded", store[id].identity()),
            }
        }

        self.loading.push(file_ref.clone());
        let scope = match caller {
            Some(caller) => caller.nested(&file_ref),
            None => FileScope::root(&file_ref),
        };
        let result = instances
            .iter()
            .try_for_each(|link| self.parse_url_asset_link(session, link, &scope).map(drop));
        self.loading.pop();
        result?;

        debug!(
            "{}: {} assets in store after load",
            file_ref,
            session.store().len()
        );
        Ok(file_id)
    }

    fn resolve_local(
        &mut self,
        session: &mut Session,
        key: NormalizedRef,
        local: &NormalizedRef,
        scope: &FileScope<'_>,
        strict: bool,
    ) -> Result<Option<AssetId>> {
        let file_ref = scope.file();

        if !session.store().contains_file(file_ref) && !self.loading.contains(file_ref) {
            // A scope file no library has still leaves the caller to try.
            match self.locate(file_ref) {
                Some(path) => {
                    self.load_path(session, &path, file_ref, scope.caller())?;
                    if let Some(id) = session.store().get(&key) {
                        return Ok(Some(id));
                    }
                }
                None => debug!("{}: scope file not in any library", file_ref),
            }
        }

        // Instances may name ids defined by the file that loaded them.
        if let Some(caller) = scope.caller() {
            let fallback = caller.file().qualify_local(local);
            if let Some(id) = session.store().get(&fallback) {
                debug!("{} found in calling file {}", local, caller.file());
                return Ok(Some(id));
            }
        }

        missing(
            session,
            Diagnostic::MissingLocalAsset {
                reference: local.to_string(),
                scope: file_ref.to_string(),
            },
            strict,
        )
    }

    fn resolve_external(
        &mut self,
        session: &mut Session,
        key: NormalizedRef,
        scope: &FileScope<'_>,
        strict: bool,
    ) -> Result<Option<AssetId>> {
        let file_ref = key.file_ref();

        // A file on the stack is already registered, so a miss there is a
        // plain missing asset unless the caller asked for strictness.
        if let Some(position) = self.loading.iter().position(|f| *f == file_ref) {
            if !strict && session.store().contains_file(&file_ref) {
                debug!("{} misses {} while it is still loading", key, file_ref);
                return missing(
                    session,
                    Diagnostic::MissingAsset {
                        reference: key.to_string(),
                        file: PathBuf::from(denormalize(file_ref.as_str())),
                    },
                    strict,
                );
            }
            return Err(AssetError::CyclicReference {
                reference: key.to_string(),
                chain: self.loading[position..]
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            });
        }

        if session.store().contains_file(&file_ref) {
            return missing(
                session,
                Diagnostic::MissingAsset {
                    reference: key.to_string(),
                    file: PathBuf::from(denormalize(file_ref.as_str())),
                },
                strict,
            );
        }

        let Some(path) = self.load_ref(session, &file_ref, &key, Some(scope), strict)? else {
            return Ok(None);
        };

        match session.store().get(&key) {
            Some(id) => Ok(Some(id)),
            None => missing(
                session,
                Diagnostic::MissingAsset {
                    reference: key.to_string(),
                    file: path,
                },
                strict,
            ),
        }
    }

    /// Locate, parse and register the file `file_ref`. Returns the path it
    /// was read from, or `None` if no library has it.
    fn load_ref(
        &mut self,
        session: &mut Session,
        file_ref: &NormalizedRef,
        key: &NormalizedRef,
        caller: Option<&FileScope<'_>>,
        strict: bool,
    ) -> Result<Option<PathBuf>> {
        let Some(path) = self.locate(file_ref) else {
            missing(
                session,
                Diagnostic::MissingLibraryPath {
                    reference: key.to_string(),
                    path: denormalize(file_ref.as_str()),
                },
                strict,
            )?;
            return Ok(None);
        };

        self.load_path(session, &path, file_ref, caller)?;
        Ok(Some(path))
    }

    /// The first library file for `file_ref`.
    fn locate(&self, file_ref: &NormalizedRef) -> Option<PathBuf> {
        self.paths
            .resolve(&denormalize(file_ref.as_str()))
            .into_iter()
            .next()
    }

    fn load_path(
        &mut self,
        session: &mut Session,
        path: &Path,
        file_ref: &NormalizedRef,
        caller: Option<&FileScope<'_>>,
    ) -> Result<AssetId> {
        let parsed = self.parser.parse(path, file_ref, session.normalizer())?;
        self.register(session, parsed, caller)
    }
}

/// Record a missing-asset condition; in strict mode it is also an error.
fn missing(session: &mut Session, diagnostic: Diagnostic, strict: bool) -> Result<Option<AssetId>> {
    let error = if strict {
        escalate(&diagnostic)
    } else {
        None
    };
    session.report(diagnostic);
    match error {
        Some(error) => Err(error),
        None => Ok(None),
    }
}

fn escalate(diagnostic: &Diagnostic) -> Option<AssetError> {
    match diagnostic.clone() {
        Diagnostic::MissingLocalAsset { reference, scope } => {
            Some(AssetError::MissingLocalAsset { reference, scope })
        }
        Diagnostic::MissingLibraryPath { reference, path } => {
            Some(AssetError::MissingLibraryPath { reference, path })
        }
        Diagnostic::MissingAsset { reference, file } => {
            Some(AssetError::MissingAsset { reference, file })
        }
        Diagnostic::DuplicateDefinition { .. } => None,
    }
}

/// An asset of `kind` already stored under `identity`. A payload that
/// differs from the stored one is reported as a duplicate definition.
fn existing_definition(
    session: &mut Session,
    identity: &NormalizedRef,
    kind: AssetKind,
    payload: &AssetPayload,
) -> Option<AssetId> {
    let existing = session.store().get_typed(identity, kind)?;
    if session.store()[existing].payload() != payload {
        session.report(Diagnostic::DuplicateDefinition {
            reference: identity.to_string(),
        });
    }
    Some(existing)
}

fn kind_matches(wanted: AssetKind, actual: AssetKind) -> bool {
    wanted == actual || (wanted == AssetKind::Node && actual.is_node())
}

fn typed_sibling(store: &AssetStore, key: &NormalizedRef, kind: AssetKind) -> Option<AssetId> {
    store
        .siblings(key)
        .iter()
        .copied()
        .find(|&id| kind_matches(kind, store[id].kind()))
}

/// The stored parent of a `child` asset. Everything except UV sets hangs
/// off a node, so a node sibling is preferred over the primary asset.
fn find_parent(store: &AssetStore, parent: &NormalizedRef, child: AssetKind) -> Option<AssetId> {
    let primary = store.get(parent)?;
    if child == AssetKind::UvSet || store[primary].kind().is_node() {
        return Some(primary);
    }
    typed_sibling(store, parent, AssetKind::Node).or(Some(primary))
}
