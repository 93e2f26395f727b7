//! Recursive removal of output trees.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::is_within;
use crate::utils::path::normalize_path;

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("refusing to delete `{}`: it contains the source tree", .0.display())]
    Protected(PathBuf),

    #[error("cannot remove `{}`", .0.display())]
    Remove(PathBuf, #[source] io::Error),
}

/// Delete `dir` and everything below it.
///
/// A missing directory is not an error (`Ok(false)`). `source_root` and its
/// ancestors are never deleted.
pub fn clean_dir(dir: &Path, source_root: &Path) -> Result<bool, CleanError> {
    let target = normalize_path(dir);
    if is_within(&normalize_path(source_root), &target) {
        return Err(CleanError::Protected(dir.to_path_buf()));
    }

    match fs::remove_dir_all(&target) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CleanError::Remove(dir.to_path_buf(), e)),
    }
}
