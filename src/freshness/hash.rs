//! Content hashing using blake3.

use std::fs::File;
use std::path::Path;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash representing "no content" (all zeros).
    #[inline]
    pub const fn empty() -> Self {
        Self([0; 32])
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 32]
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// First `len` hex characters, used in fingerprinted file names.
    pub fn short(self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len);
        hex
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short(16))
    }
}

/// Hash an in-memory buffer.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    ContentHash::new(*blake3::hash(bytes).as_bytes())
}

/// Hash a file's contents, streaming. Missing or unreadable file → empty hash.
pub fn hash_file(path: &Path) -> ContentHash {
    let mut hasher = blake3::Hasher::new();
    match File::open(path).and_then(|file| hasher.update_reader(file).map(|_| ())) {
        Ok(()) => ContentHash::new(*hasher.finalize().as_bytes()),
        Err(_) => ContentHash::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_content_hash_display() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(format!("{}", hash), "abababababababab");
        assert_eq!(hash.short(8), "abababab");
    }

    #[test]
    fn test_hash_file_matches_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.css");
        fs::write(&path, "body{color:red}").unwrap();

        assert_eq!(hash_file(&path), hash_bytes(b"body{color:red}"));
        assert_ne!(hash_file(&path), hash_bytes(b"body{color:blue}"));
    }

    #[test]
    fn test_hash_file_nonexistent() {
        assert!(hash_file(Path::new("/nonexistent/file.txt")).is_empty());
    }
}
