//! Import session settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How loudly recoverable missing-asset conditions are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Missing assets are only logged at debug level.
    Quiet,
    /// Missing assets are logged as warnings.
    #[default]
    Normal,
    /// Like `Normal`; front ends also turn on debug logging.
    Verbose,
}

/// Settings for one import session.
///
/// Can be loaded from a JSON file; any key left out keeps its default.
///
/// ```json
/// {
///     "library_roots": ["/home/me/DAZ 3D/My Library"],
///     "case_sensitive_paths": false,
///     "strict": false,
///     "verbosity": "normal"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Content library roots, searched in order.
    pub library_roots: Vec<PathBuf>,
    /// Keep the case of reference paths. When false, paths are folded to
    /// lower case before they are used as store keys. Off by default
    /// except on Windows.
    pub case_sensitive_paths: bool,
    /// Retry failed lookups with a case-insensitive directory listing.
    pub case_insensitive_fallback: bool,
    /// Treat every missing asset as a hard error.
    pub strict: bool,
    /// Reporting level for recoverable conditions.
    pub verbosity: Verbosity,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library_roots: Vec::new(),
            case_sensitive_paths: cfg!(windows),
            case_insensitive_fallback: true,
            strict: false,
            verbosity: Verbosity::Normal,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse settings from a JSON string.
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        for root in &self.library_roots {
            if root.as_os_str().is_empty() {
                return Err(Error::InvalidSettings("empty library root".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.library_roots.is_empty());
        assert_eq!(settings.case_sensitive_paths, cfg!(windows));
        assert!(settings.case_insensitive_fallback);
        assert!(!settings.strict);
        assert_eq!(settings.verbosity, Verbosity::Normal);
    }

    #[test]
    fn test_partial_json() {
        let settings = Settings::from_json(r#"{"strict": true, "verbosity": "quiet"}"#).unwrap();
        assert!(settings.strict);
        assert_eq!(settings.verbosity, Verbosity::Quiet);
        assert!(settings.case_insensitive_fallback);
    }

    #[test]
    fn test_empty_root_rejected() {
        let result = Settings::from_json(r#"{"library_roots": [""]}"#);
        assert!(matches!(result, Err(Error::InvalidSettings(_))));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"library_roots": ["/lib/a", "/lib/b"]}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(
            settings.library_roots,
            vec![PathBuf::from("/lib/a"), PathBuf::from("/lib/b")]
        );
    }
}
