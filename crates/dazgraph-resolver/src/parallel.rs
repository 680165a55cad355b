//! Parallel preloading of library files using rayon.
//!
//! Parsing is pure, so a batch of files can be parsed on rayon's thread
//! pool. Registration touches the session and runs sequentially afterwards,
//! in the order the files were given.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use dazgraph_asset::{AssetKind, Session};
use log::{debug, warn};
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::parser::FileParser;
use crate::paths::PathResolver;
use crate::resolver::Resolver;

impl<P: PathResolver, F: FileParser + Sync> Resolver<P, F> {
    /// Parse `files` in parallel and register them into `session`.
    ///
    /// Files already loaded are skipped. Files that fail to parse or
    /// register are counted as errors and logged; the rest of the batch
    /// still loads. The progress callback receives (parsed, total) counts.
    pub fn preload<G>(
        &mut self,
        session: &mut Session,
        files: &[PathBuf],
        mut progress: G,
    ) -> PreloadStats
    where
        G: FnMut(usize, usize) + Send,
    {
        let jobs: Vec<_> = files
            .iter()
            .map(|path| (path, self.file_ref_for(session, path)))
            .filter(|(_, file_ref)| !session.store().contains_file(file_ref))
            .collect();
        let total = jobs.len();
        let skipped = files.len() - total;

        let parsed_count = AtomicUsize::new(0);
        let progress = Mutex::new(&mut progress);
        let parser = self.parser();
        let normalizer = session.normalizer();

        let parsed: Vec<_> = jobs
            .par_iter()
            .map(|(path, file_ref)| {
                let result = parser.parse(path, file_ref, normalizer);

                let done = parsed_count.fetch_add(1, Ordering::Relaxed) + 1;
                if done % 100 == 0 || done == total {
                    if let Some(mut p) = progress.try_lock() {
                        (*p)(done, total);
                    }
                }
                result
            })
            .collect();

        progress.lock()(total, total);

        let mut loaded = 0;
        let mut errors = 0;
        for (result, (path, _)) in parsed.into_iter().zip(&jobs) {
            let registered = result.and_then(|file| self.register(session, file, None));
            match registered {
                Ok(_) => loaded += 1,
                Err(e) => {
                    warn!("{}: {}", path.display(), e);
                    errors += 1;
                }
            }
        }

        debug!(
            "preloaded {} file(s), {} error(s), {} skipped, {} file assets in store",
            loaded,
            errors,
            skipped,
            session.store().iter_kind(AssetKind::File).count()
        );

        PreloadStats {
            loaded,
            errors,
            skipped,
            total,
        }
    }
}

/// Statistics from a parallel preload.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreloadStats {
    /// Files parsed and registered.
    pub loaded: usize,
    /// Files that failed to parse or register.
    pub errors: usize,
    /// Files that were already loaded.
    pub skipped: usize,
    /// Files attempted.
    pub total: usize,
}

impl PreloadStats {
    /// Check if every attempted file loaded.
    pub fn is_complete(&self) -> bool {
        self.errors == 0 && self.loaded == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use dazgraph_common::Settings;

    use crate::{DsonParser, FileScope, LibraryPaths};

    fn write(root: &std::path::Path, relative: &str, text: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_preload_batch() {
        let root = tempfile::tempdir().unwrap();
        let files = vec![
            write(
                root.path(),
                "data/a.dsf",
                r#"{ "asset_info": { "id": "/data/a.dsf" }, "node_library": [ { "id": "a" } ] }"#,
            ),
            write(
                root.path(),
                "data/b.dsf",
                r#"{ "asset_info": { "id": "/data/b.dsf" }, "node_library": [ { "id": "b" } ] }"#,
            ),
            write(root.path(), "data/broken.dsf", "{ not json"),
        ];

        let paths = LibraryPaths::new(vec![root.path().to_path_buf()], false);
        let mut resolver = Resolver::new(paths, DsonParser::new());
        let mut session = Session::new(Settings {
            case_sensitive_paths: true,
            ..Settings::default()
        });

        let mut calls = Vec::new();
        let stats = resolver.preload(&mut session, &files, |done, total| calls.push((done, total)));

        assert_eq!(stats.total, 3);
        assert_eq!(stats.loaded, 2);
        assert_eq!(stats.errors, 1);
        assert!(!stats.is_complete());
        assert_eq!(calls.last(), Some(&(3, 3)));

        // Preloaded assets resolve without parsing again.
        let scene = session.normalize("/Scenes/s.duf");
        let scope = FileScope::root(&scene);
        let found = resolver
            .resolve(&mut session, "/data/b.dsf#b", &scope, true)
            .unwrap();
        assert!(found.is_some());

        let again = resolver.preload(&mut session, &files[..2], |_, _| {});
        assert_eq!(again.skipped, 2);
        assert_eq!(again.total, 0);
        assert!(again.is_complete());
    }
}
