//! Content-addressed file names for cache busting.
//!
//! `css/app.css` with content hash `1a2b3c4d…` becomes `css/app.1a2b3c4d.css`.
//! Identical content always yields the identical name, so repeated production
//! builds are byte-for-byte stable.

use std::path::{Path, PathBuf};

use crate::freshness::ContentHash;
use crate::utils::path::slash_relative;

/// Insert the hash segment before the extension: `dir/stem.<hash>.ext`.
pub fn fingerprint_path(path: &Path, hash: ContentHash, len: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let short = hash.short(len);
    let name = match path.extension() {
        Some(ext) => format!("{stem}.{short}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{short}"),
    };
    path.with_file_name(name)
}

/// Manifest key for `path` relative to `base`, with `/` separators.
pub fn manifest_key(path: &Path, base: &Path) -> String {
    slash_relative(path, base).unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freshness::hash_bytes;

    #[test]
    fn test_fingerprint_path() {
        let hash = ContentHash::new([0x1a; 32]);
        assert_eq!(
            fingerprint_path(Path::new("dist/css/app.css"), hash, 8),
            PathBuf::from("dist/css/app.1a1a1a1a.css")
        );
        assert_eq!(
            fingerprint_path(Path::new("LICENSE"), hash, 4),
            PathBuf::from("LICENSE.1a1a")
        );
    }

    #[test]
    fn test_same_content_same_name() {
        let a = fingerprint_path(Path::new("app.js"), hash_bytes(b"let a=1"), 8);
        let b = fingerprint_path(Path::new("app.js"), hash_bytes(b"let a=1"), 8);
        let c = fingerprint_path(Path::new("app.js"), hash_bytes(b"let a=2"), 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_manifest_key() {
        assert_eq!(
            manifest_key(Path::new("/d/images/icons/a.png"), Path::new("/d/images")),
            "icons/a.png"
        );
    }
}
