//! Name validation and the on-disk layout of record keys.
//!
//! Keys are hex-encoded before they touch the filesystem, so a record id can never name a
//! path outside its collection directory. Files are sharded two levels deep by the first
//! four hex characters: `<collection>/ab/cd/abcd….rec`.

use crate::error::StoreError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Longest accepted record id, in bytes.
pub const MAX_KEY_BYTES: usize = 120;

const MAX_NAME_LEN: usize = 64;
pub(crate) const RECORD_EXTENSION: &str = "rec";

/// A validated database or collection name.
///
/// Names are trimmed and lowercased; they may contain `a-z`, `0-9`, `_` and `-` and must
/// start with a letter or digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreName(String);

impl StoreName {
    pub(crate) fn parse(kind: &'static str, raw: &str) -> Result<Self, StoreError> {
        let name = raw.trim().to_lowercase();

        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(StoreError::Configuration {
                message: format!("{kind} name must be 1..={MAX_NAME_LEN} characters").into(),
                context: Some(format!("got '{raw}'").into()),
            });
        }

        let valid_start = name.starts_with(|c: char| c.is_ascii_alphanumeric());
        let valid_chars =
            name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if !valid_start || !valid_chars {
            return Err(StoreError::Configuration {
                message: format!("{kind} name may only contain a-z, 0-9, '_' and '-'").into(),
                context: Some(format!("got '{raw}'").into()),
            });
        }

        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StoreName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rejects ids the engine cannot store.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey { message: "Record id is empty".into(), context: None });
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(StoreError::InvalidKey {
            message: format!("Record id exceeds {MAX_KEY_BYTES} bytes").into(),
            context: Some(format!("{} bytes", key.len()).into()),
        });
    }
    Ok(())
}

/// Resolves the sharded file path of `key` inside the collection directory `dir`.
pub(crate) fn record_path(dir: &Path, key: &str) -> Result<PathBuf, StoreError> {
    validate_key(key)?;

    let encoded = hex::encode(key.as_bytes());
    let mut path = dir.to_path_buf();
    if encoded.len() >= 4 {
        path.push(&encoded[0..2]);
        path.push(&encoded[2..4]);
    }
    path.push(format!("{encoded}.{RECORD_EXTENSION}"));
    Ok(path)
}

/// Recovers the record id from a record file path, `None` for anything else.
pub(crate) fn key_from_path(path: &Path) -> Option<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let bytes = hex::decode(stem).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_normalized() {
        let name = StoreName::parse("collection", "  Images ").unwrap();
        assert_eq!(name.as_str(), "images");
        assert_eq!(StoreName::parse("database", "media-db").unwrap().as_str(), "media-db");
    }

    #[test]
    fn names_reject_paths_and_dots() {
        for raw in ["", "   ", "../etc", "a/b", ".hidden", "-lead", "with space", "ümlaut"] {
            assert!(
                matches!(StoreName::parse("collection", raw), Err(StoreError::Configuration { .. })),
                "'{raw}' must be rejected"
            );
        }
    }

    #[test]
    fn record_paths_are_sharded_and_contained() {
        let dir = Path::new("/data/media-db/images");
        let path = record_path(dir, "../../escape").unwrap();
        assert!(path.starts_with(dir));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some(RECORD_EXTENSION));
        // "../../escape" hex-encodes to "2e2e2f…", sharded as 2e/2e/
        assert!(path.starts_with(dir.join("2e").join("2e")));
        assert_eq!(key_from_path(&path).as_deref(), Some("../../escape"));
    }

    #[test]
    fn short_keys_skip_sharding() {
        let dir = Path::new("/data/c");
        assert_eq!(record_path(dir, "a").unwrap(), dir.join("61.rec"));
    }

    #[test]
    fn keys_are_bounded() {
        assert!(matches!(record_path(Path::new("/d"), ""), Err(StoreError::InvalidKey { .. })));
        let long = "k".repeat(MAX_KEY_BYTES + 1);
        assert!(matches!(record_path(Path::new("/d"), &long), Err(StoreError::InvalidKey { .. })));
        assert!(record_path(Path::new("/d"), &"k".repeat(MAX_KEY_BYTES)).is_ok());
    }

    #[test]
    fn foreign_files_are_not_keys() {
        assert_eq!(key_from_path(Path::new("/d/61.rec.lumotmp.1")), None);
        assert_eq!(key_from_path(Path::new("/d/zz.rec")), None);
        assert_eq!(key_from_path(Path::new("/d/61.json")), None);
    }
}
