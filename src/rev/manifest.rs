//! Fingerprint manifests (`rev-manifest.json`).
//!
//! ```json
//! {
//!   "app.css": "app.1a2b3c4d.css"
//! }
//! ```
//!
//! Keys are sorted, so a manifest written from the same outputs is always
//! byte-identical.

use jwalk::WalkDir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::RevError;
use crate::config::MANIFEST_FILE;
use crate::freshness::{WriteOutcome, write_if_changed};

/// Original name → fingerprinted name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, String>);

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, original: impl Into<String>, named: impl Into<String>) {
        self.0.insert(original.into(), named.into());
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.0.get(original).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge `other` into `self`; entries of `other` win.
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    pub fn load(path: &Path) -> Result<Self, RevError> {
        let content =
            fs::read_to_string(path).map_err(|e| RevError::Read(path.to_path_buf(), e))?;
        serde_json::from_str(&content).map_err(|e| RevError::Json(path.to_path_buf(), e))
    }

    /// Merge every `rev-manifest.json` under `dir` (in path order).
    ///
    /// A missing directory yields an empty manifest.
    pub fn load_dir(dir: &Path) -> Result<Self, RevError> {
        let mut merged = Self::new();
        if !dir.is_dir() {
            return Ok(merged);
        }

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(dir).sort(true) {
            let entry = entry.map_err(|e| RevError::Walk(dir.to_path_buf(), e.to_string()))?;
            if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE {
                paths.push(entry.path());
            }
        }
        paths.sort();

        for path in paths {
            merged.merge(Self::load(&path)?);
        }
        Ok(merged)
    }

    /// Write as pretty JSON, skipping the write when nothing changed.
    pub fn write(&self, path: &Path) -> Result<WriteOutcome, RevError> {
        let mut json =
            serde_json::to_string_pretty(self).map_err(|e| RevError::Json(path.to_path_buf(), e))?;
        json.push('\n');
        write_if_changed(path, json.as_bytes()).map_err(|e| RevError::Write(path.to_path_buf(), e))
    }
}

impl FromIterator<(String, String)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for Manifest {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_sorted_and_stable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rev/css").join(MANIFEST_FILE);

        let mut manifest = Manifest::new();
        manifest.insert("z.css", "z.00000000.css");
        manifest.insert("a.css", "a.11111111.css");

        assert_eq!(manifest.write(&path).unwrap(), WriteOutcome::Written);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n  \"a.css\": \"a.11111111.css\",\n  \"z.css\": \"z.00000000.css\"\n}\n"
        );
        assert_eq!(manifest.write(&path).unwrap(), WriteOutcome::Unchanged);
        assert_eq!(Manifest::load(&path).unwrap(), manifest);
    }

    #[test]
    fn test_load_dir_merges() {
        let dir = TempDir::new().unwrap();
        let rev = dir.path().join("rev");

        let css: Manifest = [("app.css".to_string(), "app.aaaaaaaa.css".to_string())]
            .into_iter()
            .collect();
        let js: Manifest = [("app.js".to_string(), "app.bbbbbbbb.js".to_string())]
            .into_iter()
            .collect();
        css.write(&rev.join("css").join(MANIFEST_FILE)).unwrap();
        js.write(&rev.join("js").join(MANIFEST_FILE)).unwrap();
        fs::write(rev.join("notes.json"), "not a manifest").unwrap();

        let merged = Manifest::load_dir(&rev).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("app.js"), Some("app.bbbbbbbb.js"));
    }

    #[test]
    fn test_load_dir_missing() {
        let dir = TempDir::new().unwrap();
        assert!(Manifest::load_dir(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        fs::write(&path, "{").unwrap();
        assert!(matches!(Manifest::load(&path), Err(RevError::Json(..))));
    }
}
