//! DSON file reading.
//!
//! DAZ Studio writes `.duf` and `.dsf` files either as plain UTF-8 JSON or
//! as a gzip stream wrapping that JSON. The two are told apart by the gzip
//! magic bytes, never by the file extension.

use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Gzip member header magic.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check whether a buffer starts with the gzip magic.
#[inline]
pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[..2] == GZIP_MAGIC
}

/// Decompress a gzip stream.
pub fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut output = Vec::with_capacity(data.len() * 4);
    decoder
        .read_to_end(&mut output)
        .map_err(|e| Error::Decompression(e.to_string()))?;
    Ok(output)
}

/// Decode DSON bytes, decompressing first when they are gzipped.
pub fn read_dson_bytes<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    if is_gzip(data) {
        let json = decompress_gzip(data)?;
        Ok(serde_json::from_slice(&json)?)
    } else {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Read and decode a DSON file from disk.
pub fn read_dson<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    read_dson_bytes(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    const DOC: &str = r#"{"file_version":"0.6.0.0","asset_info":{"id":"/data/test.dsf"}}"#;

    #[test]
    fn test_is_gzip() {
        assert!(is_gzip(&[0x1f, 0x8b, 0x08]));
        assert!(!is_gzip(b"{}"));
        assert!(!is_gzip(&[0x1f]));
    }

    #[test]
    fn test_plain_json() {
        let value: serde_json::Value = read_dson_bytes(DOC.as_bytes()).unwrap();
        assert_eq!(value["asset_info"]["id"], "/data/test.dsf");
    }

    #[test]
    fn test_gzipped_json() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(DOC.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let value: serde_json::Value = read_dson_bytes(&compressed).unwrap();
        assert_eq!(value["file_version"], "0.6.0.0");
    }

    #[test]
    fn test_truncated_gzip() {
        let result: Result<serde_json::Value> = read_dson_bytes(&[0x1f, 0x8b, 0x08, 0x00]);
        assert!(matches!(result, Err(Error::Decompression(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<serde_json::Value> = read_dson(dir.path().join("nope.duf"));
        assert!(matches!(result, Err(Error::FileRead { .. })));
    }
}
