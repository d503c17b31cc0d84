//! Key to storage name mapping

use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex-encoded SHA-256 digest of a cache key
pub fn key_hash(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Everything from the last `.` of the file name, or an empty string.
pub fn extension_of(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.rfind('.').map(|idx| &name[idx..]))
        .unwrap_or("")
}

/// Storage name for `key` when backed by `source`.
///
/// Only the extension depends on the source file, so two puts of the same
/// key land on the same name unless the extension changes.
pub fn storage_name(key: &str, source: &Path) -> String {
    format!("{}{}", key_hash(key), extension_of(source))
}
