//! Locating library-relative paths on disk.

use std::fs;
use std::path::{Component, Path, PathBuf};

use dazgraph_common::Settings;
use log::debug;

/// Maps library-relative paths (`/data/DAZ 3D/...`) to files on disk.
pub trait PathResolver {
    /// Candidate files for a library-relative path, best first.
    fn resolve(&self, library_path: &str) -> Vec<PathBuf>;

    /// The library-relative form of an absolute path, if it lies in a library.
    fn library_relative(&self, _path: &Path) -> Option<String> {
        None
    }
}

impl<T: PathResolver + ?Sized> PathResolver for &T {
    fn resolve(&self, library_path: &str) -> Vec<PathBuf> {
        (**self).resolve(library_path)
    }

    fn library_relative(&self, path: &Path) -> Option<String> {
        (**self).library_relative(path)
    }
}

/// An ordered list of content library roots.
///
/// A path is first joined to every root as is. If no root has it and the
/// case-insensitive fallback is enabled, each root is searched again
/// comparing directory entries without regard to case, since DAZ content
/// is shipped with inconsistent case.
#[derive(Debug, Clone, Default)]
pub struct LibraryPaths {
    roots: Vec<PathBuf>,
    case_insensitive: bool,
}

impl LibraryPaths {
    pub fn new(roots: Vec<PathBuf>, case_insensitive: bool) -> Self {
        Self {
            roots,
            case_insensitive,
        }
    }

    /// Build from session settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.library_roots.clone(),
            settings.case_insensitive_fallback || !settings.case_sensitive_paths,
        )
    }

    #[inline]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Append a root (searched last).
    pub fn push_root(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    /// Path components below a root, or `None` if the path climbs out of it.
    fn relative_components(library_path: &str) -> Option<Vec<&str>> {
        let components: Vec<&str> = library_path
            .split(['/', '\\'])
            .filter(|c| !c.is_empty() && *c != ".")
            .collect();
        (!components.contains(&"..")).then_some(components)
    }

    fn find_case_insensitive(root: &Path, components: &[&str]) -> Option<PathBuf> {
        let mut current = root.to_path_buf();

        for component in components {
            let exact = current.join(component);
            if exact.exists() {
                current = exact;
                continue;
            }

            let wanted = component.to_lowercase();
            let entry = fs::read_dir(&current).ok()?.flatten().find(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| name.to_lowercase() == wanted)
                    .unwrap_or(false)
            })?;
            current = entry.path();
        }

        current.is_file().then_some(current)
    }
}

impl PathResolver for LibraryPaths {
    fn resolve(&self, library_path: &str) -> Vec<PathBuf> {
        let Some(components) = Self::relative_components(library_path) else {
            debug!("{} leaves the library roots", library_path);
            return Vec::new();
        };
        if components.is_empty() {
            return Vec::new();
        }

        let mut found: Vec<PathBuf> = self
            .roots
            .iter()
            .map(|root| components.iter().fold(root.clone(), |path, c| path.join(c)))
            .filter(|path| path.is_file())
            .collect();

        if found.is_empty() && self.case_insensitive {
            found = self
                .roots
                .iter()
                .filter_map(|root| Self::find_case_insensitive(root, &components))
                .collect();
        }

        // References written with an absolute disk path.
        if found.is_empty() {
            let direct = Path::new(library_path);
            if direct.is_absolute() && direct.is_file() {
                found.push(direct.to_path_buf());
            }
        }

        debug!("{} -> {} candidate(s)", library_path, found.len());
        found
    }

    fn library_relative(&self, path: &Path) -> Option<String> {
        self.roots.iter().find_map(|root| {
            let relative = path.strip_prefix(root).ok()?;
            let mut out = String::new();
            for component in relative.components() {
                if let Component::Normal(part) = component {
                    out.push('/');
                    out.push_str(part.to_str()?);
                }
            }
            (!out.is_empty()).then_some(out)
        })
    }
}
