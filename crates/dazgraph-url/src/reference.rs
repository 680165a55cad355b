//! Normalized reference type.

use std::fmt;

use crate::Normalizer;

/// How a reference is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// `#id`: an id inside the file that is currently being read.
    Local,
    /// `/path#id`: a path from a content library root.
    Absolute,
    /// `path#id`: a path relative to the directory of the current file.
    Relative,
}

/// A reference in canonical form, usable as a store key.
///
/// Values are only produced by [`Normalizer::normalize`] and [`join`], so two
/// `NormalizedRef`s compare equal exactly when they denote the same asset
/// under the normalizer's case policy.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NormalizedRef(String);

impl NormalizedRef {
    #[inline]
    pub(crate) fn from_normalized(s: String) -> Self {
        Self(s)
    }

    /// The key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string.
    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the reference is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Classify the reference by its first character.
    pub fn kind(&self) -> RefKind {
        match self.0.as_bytes().first() {
            Some(b'#') => RefKind::Local,
            Some(b'/') => RefKind::Absolute,
            _ => RefKind::Relative,
        }
    }

    /// Whether this is a same-file `#id` reference.
    #[inline]
    pub fn is_local(&self) -> bool {
        self.kind() == RefKind::Local
    }

    /// Whether this addresses a channel (`...#node?rotation/x`) rather than an asset.
    #[inline]
    pub fn is_channel(&self) -> bool {
        memchr::memchr(b'?', self.0.as_bytes()).is_some()
    }

    /// The path component (empty for local references).
    pub fn path(&self) -> &str {
        match memchr::memchr(b'#', self.0.as_bytes()) {
            Some(pos) => &self.0[..pos],
            None => &self.0,
        }
    }

    /// The fragment component, without the `#`.
    pub fn fragment(&self) -> Option<&str> {
        memchr::memchr(b'#', self.0.as_bytes()).map(|pos| &self.0[pos + 1..])
    }

    /// The reference with its fragment stripped, i.e. the owning file.
    pub fn file_ref(&self) -> NormalizedRef {
        Self(self.path().to_string())
    }

    /// Attach a local `#id` reference to this reference's file.
    pub fn qualify_local(&self, local: &NormalizedRef) -> NormalizedRef {
        let mut out = String::with_capacity(self.path().len() + local.0.len());
        out.push_str(self.path());
        out.push_str(&local.0);
        Self(out)
    }

    /// Attach a raw fragment id to this reference's file.
    pub fn with_fragment(&self, normalizer: &Normalizer, id: &str) -> NormalizedRef {
        let fragment = normalizer.normalize(&format!("#{}", id));
        self.qualify_local(&fragment)
    }
}

impl fmt::Debug for NormalizedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NormalizedRef({})", self.0)
    }
}

impl fmt::Display for NormalizedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for NormalizedRef {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for NormalizedRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Resolve `reference` against the file `base`.
///
/// Local references are attached to `base`'s file, absolute references are
/// returned unchanged and relative references are joined to `base`'s
/// directory with `.` and `..` segments collapsed.
pub fn join(base: &NormalizedRef, reference: &NormalizedRef) -> NormalizedRef {
    match reference.kind() {
        RefKind::Local => return base.qualify_local(reference),
        RefKind::Absolute => return reference.clone(),
        RefKind::Relative => {}
    }

    let base_path = base.path();
    let dir = match base_path.rfind('/') {
        Some(pos) => &base_path[..pos],
        None => "",
    };
    let rooted = base_path.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in dir.split('/').chain(reference.path().split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().map_or(false, |s| *s != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            s => segments.push(s),
        }
    }

    let mut out = String::with_capacity(base_path.len() + reference.0.len());
    if rooted {
        out.push('/');
    }
    out.push_str(&segments.join("/"));
    if let Some(fragment) = reference.fragment() {
        out.push('#');
        out.push_str(fragment);
    }

    NormalizedRef(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> NormalizedRef {
        Normalizer::new(true).normalize(s)
    }

    #[test]
    fn test_kinds() {
        assert_eq!(n("#hip").kind(), RefKind::Local);
        assert_eq!(n("/data/a.dsf#hip").kind(), RefKind::Absolute);
        assert_eq!(n("a.dsf#hip").kind(), RefKind::Relative);
        assert_eq!(n("\\data\\a.dsf").kind(), RefKind::Absolute);
    }

    #[test]
    fn test_components() {
        let r = n("/data/Genesis 3/G3F.dsf#Genesis3Female");
        assert_eq!(r.path(), "/data/Genesis%203/G3F.dsf");
        assert_eq!(r.fragment(), Some("Genesis3Female"));
        assert_eq!(r.file_ref().as_str(), "/data/Genesis%203/G3F.dsf");

        let local = n("#hip");
        assert_eq!(local.path(), "");
        assert_eq!(local.fragment(), Some("hip"));

        assert_eq!(n("/data/a.dsf").fragment(), None);
    }

    #[test]
    fn test_channel() {
        assert!(n("#hip?rotation/x/value").is_channel());
        assert!(!n("/data/a.dsf#hip").is_channel());
    }

    #[test]
    fn test_qualify_local() {
        let file = n("/data/a.dsf#ignored");
        assert_eq!(file.qualify_local(&n("#hip")).as_str(), "/data/a.dsf#hip");
        assert_eq!(
            file.with_fragment(&Normalizer::new(true), "left hand").as_str(),
            "/data/a.dsf#left%20hand"
        );
    }

    #[test]
    fn test_join_relative() {
        let base = n("/data/DAZ 3D/Genesis 3/Female/Genesis3Female.dsf");
        assert_eq!(
            join(&base, &n("Morphs/pJCM.dsf#pJCM")).as_str(),
            "/data/DAZ%203D/Genesis%203/Female/Morphs/pJCM.dsf#pJCM"
        );
        assert_eq!(
            join(&base, &n("../Male/./G3M.dsf")).as_str(),
            "/data/DAZ%203D/Genesis%203/Male/G3M.dsf"
        );
        assert_eq!(join(&n("/a.dsf"), &n("../../b.dsf")).as_str(), "/b.dsf");
        assert_eq!(join(&n("scene.duf"), &n("../b.dsf")).as_str(), "../b.dsf");
    }

    #[test]
    fn test_join_other_kinds() {
        let base = n("/data/a.dsf");
        assert_eq!(join(&base, &n("#hip")).as_str(), "/data/a.dsf#hip");
        assert_eq!(join(&base, &n("/data/b.dsf#x")).as_str(), "/data/b.dsf#x");
    }
}
