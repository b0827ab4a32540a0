//! Path normalization for cache keys

use crate::error::SnapshotError;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Normalize an absolute path into a stable cache-key form.
///
/// This function:
/// 1. Rejects relative paths (snapshot roots are absolute by contract)
/// 2. Normalizes Unicode to NFC
/// 3. Removes trailing separators (except root)
///
/// It never touches the filesystem: roots that do not exist yet must still
/// produce stable keys, so there is no canonicalization through symlinks.
pub fn normalize_key_path(path: &Path) -> Result<PathBuf, SnapshotError> {
    if !path.is_absolute() {
        return Err(SnapshotError::InvalidPath(format!(
            "snapshot roots must be absolute: {}",
            path.display()
        )));
    }

    // Normalize Unicode to NFC (Canonical Composition)
    let mut normalized: String = path.to_string_lossy().nfc().collect();

    // Remove trailing separators (except root)
    while normalized.len() > 1 && (normalized.ends_with('/') || normalized.ends_with('\\')) {
        normalized.pop();
    }

    Ok(PathBuf::from(normalized))
}
