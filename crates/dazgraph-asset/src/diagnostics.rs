//! Recoverable conditions collected during an import.

use std::fmt;
use std::path::PathBuf;

use dazgraph_common::Verbosity;
use log::{debug, warn};

/// A recoverable condition met while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    MissingLocalAsset { reference: String, scope: String },
    MissingLibraryPath { reference: String, path: String },
    MissingAsset { reference: String, file: PathBuf },
    DuplicateDefinition { reference: String },
}

impl Diagnostic {
    /// Whether this condition means an asset is absent from the scene.
    pub fn is_missing(&self) -> bool {
        !matches!(self, Diagnostic::DuplicateDefinition { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingLocalAsset { reference, scope } => {
                write!(f, "missing local asset {} (in {})", reference, scope)
            }
            Diagnostic::MissingLibraryPath { path, .. } => {
                write!(f, "file not found in any library root: {}", path)
            }
            Diagnostic::MissingAsset { reference, file } => {
                write!(f, "asset {} not defined in {}", reference, file.display())
            }
            Diagnostic::DuplicateDefinition { reference } => {
                write!(f, "duplicate definition of {}, keeping the first", reference)
            }
        }
    }
}

/// Session-wide log of recoverable conditions.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    missing: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a condition and log it according to `verbosity`.
    pub fn record(&mut self, diagnostic: Diagnostic, verbosity: Verbosity) {
        if diagnostic.is_missing() {
            self.missing = true;
        }

        match verbosity {
            Verbosity::Quiet => debug!("{}", diagnostic),
            Verbosity::Normal | Verbosity::Verbose => warn!("{}", diagnostic),
        }

        if !self.entries.contains(&diagnostic) {
            self.entries.push(diagnostic);
        }
    }

    /// Whether any asset was reported missing.
    #[inline]
    pub fn some_assets_missing(&self) -> bool {
        self.missing
    }

    #[inline]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One end-of-import notice, or `None` if nothing went missing.
    pub fn summary(&self) -> Option<String> {
        if !self.missing {
            return None;
        }

        let missing: Vec<&Diagnostic> = self.entries.iter().filter(|d| d.is_missing()).collect();
        let mut text = format!("{} asset(s) could not be found:", missing.len());
        for diagnostic in missing {
            text.push_str("\n  ");
            text.push_str(&diagnostic.to_string());
        }
        Some(text)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.missing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_is_not_missing() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record(
            Diagnostic::DuplicateDefinition {
                reference: "/scene.duf#x".into(),
            },
            Verbosity::Quiet,
        );
        assert!(!diagnostics.some_assets_missing());
        assert_eq!(diagnostics.summary(), None);
        assert_eq!(diagnostics.entries().len(), 1);
    }

    #[test]
    fn test_summary() {
        let mut diagnostics = Diagnostics::new();
        let missing = Diagnostic::MissingLibraryPath {
            reference: "/data/gone.dsf#x".into(),
            path: "/data/gone.dsf".into(),
        };
        diagnostics.record(missing.clone(), Verbosity::Quiet);
        diagnostics.record(missing, Verbosity::Quiet);

        assert!(diagnostics.some_assets_missing());
        assert_eq!(diagnostics.entries().len(), 1);
        let summary = diagnostics.summary().unwrap();
        assert!(summary.starts_with("1 asset(s) could not be found:"));
        assert!(summary.contains("/data/gone.dsf"));

        diagnostics.clear();
        assert!(!diagnostics.some_assets_missing());
        assert!(diagnostics.is_empty());
    }
}
