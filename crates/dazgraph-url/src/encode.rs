//! Percent-encoding and case folding of references.

use std::borrow::Cow;

use crate::NormalizedRef;

/// Characters that are percent-encoded in a normalized reference.
const RESERVED: &[u8] = b" !\"$%&'()+,:;<=>@[]^`{}";

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Check whether a byte is percent-encoded by [`Normalizer::normalize`].
#[inline]
pub fn is_reserved(byte: u8) -> bool {
    RESERVED.contains(&byte)
}

/// Canonicalizes DAZ references into store keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    case_sensitive: bool,
}

impl Default for Normalizer {
    /// Case-sensitive on Windows, case-folding elsewhere.
    fn default() -> Self {
        Self::new(cfg!(windows))
    }
}

impl Normalizer {
    /// Create a normalizer with the given case policy.
    pub const fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    /// Whether path components keep their case.
    #[inline]
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Normalize a reference.
    ///
    /// The path component is case folded (when case-insensitive), has `//`
    /// collapsed to `/` and is percent-encoded. The fragment is only
    /// percent-encoded. Already encoded `%XX` sequences are kept, so
    /// normalizing a normalized reference is a no-op.
    pub fn normalize(&self, reference: &str) -> NormalizedRef {
        let reference: Cow<'_, str> = if reference.contains('\\') {
            Cow::Owned(reference.replace('\\', "/"))
        } else {
            Cow::Borrowed(reference)
        };

        let (path, fragment) = match memchr::memchr(b'#', reference.as_bytes()) {
            Some(pos) => (&reference[..pos], Some(&reference[pos + 1..])),
            None => (&reference[..], None),
        };

        let path: Cow<'_, str> = if self.case_sensitive {
            Cow::Borrowed(path)
        } else {
            Cow::Owned(path.to_lowercase())
        };

        let mut out = String::with_capacity(reference.len() + 16);
        encode_into(&collapse_separators(&path), &mut out);
        if let Some(fragment) = fragment {
            out.push('#');
            encode_into(fragment, &mut out);
        }

        NormalizedRef::from_normalized(out)
    }
}

fn collapse_separators(path: &str) -> Cow<'_, str> {
    if !path.contains("//") {
        return Cow::Borrowed(path);
    }

    let mut out = String::with_capacity(path.len());
    let mut last_slash = false;
    for c in path.chars() {
        if c == '/' {
            if last_slash {
                continue;
            }
            last_slash = true;
        } else {
            last_slash = false;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

fn encode_into(input: &str, out: &mut String) {
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if b == b'%' && i + 2 < bytes.len() && is_hex(bytes[i + 1]) && is_hex(bytes[i + 2]) {
            out.push('%');
            out.push(bytes[i + 1].to_ascii_uppercase() as char);
            out.push(bytes[i + 2].to_ascii_uppercase() as char);
            i += 3;
            continue;
        }

        if is_reserved(b) {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
            i += 1;
            continue;
        }

        // Copy the whole UTF-8 sequence starting here.
        let len = utf8_len(b);
        out.push_str(&input[i..i + len]);
        i += len;
    }
}

#[inline]
fn is_hex(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

#[inline]
fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => 4,
    }
}

/// Decode every `%XX` escape in a reference.
///
/// Used for diagnostics and for building filesystem paths. Invalid escapes
/// are copied through unchanged.
pub fn denormalize(reference: &str) -> String {
    let bytes = reference.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && is_hex(bytes[i + 1])
            && is_hex(bytes[i + 2])
        {
            out.push(hex_value(bytes[i + 1]) << 4 | hex_value(bytes[i + 2]));
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[inline]
fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}
