//! Write-if-changed: the skip-processing check every pipeline stage runs
//! before touching an output file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::hash::{ContentHash, hash_bytes, hash_file};

/// What [`write_if_changed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

impl WriteOutcome {
    pub const fn is_written(self) -> bool {
        matches!(self, Self::Written)
    }
}

/// True iff `dest` exists and already holds content hashing to `candidate`.
pub fn is_unchanged(dest: &Path, candidate: ContentHash) -> bool {
    let existing = hash_file(dest);
    !existing.is_empty() && existing == candidate
}

/// Write `bytes` to `dest` unless it already holds exactly those bytes.
///
/// Parent directories are created. The write goes to a sibling temp file
/// first and is renamed into place, so readers (the dev server, the
/// staging watcher) never observe a half-written file.
pub fn write_if_changed(dest: &Path, bytes: &[u8]) -> io::Result<WriteOutcome> {
    if is_unchanged(dest, hash_bytes(bytes)) {
        return Ok(WriteOutcome::Unchanged);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_sibling(dest);
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    Ok(WriteOutcome::Written)
}

/// `dir/.name.ferrule-tmp`, ignored by the watchers.
fn temp_sibling(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{name}.ferrule-tmp"))
}
