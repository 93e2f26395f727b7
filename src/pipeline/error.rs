//! Pipeline error types.
//!
//! Two tiers: [`PipelineError`] aborts a whole pipeline run (the source tree
//! cannot be walked, the destination cannot be written), while a
//! [`FileFailure`] is recorded against one file and its siblings keep going.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal-per-run errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot walk `{}`: {message}", path.display())]
    Walk { path: PathBuf, message: String },

    #[error("cannot write `{}`", .0.display())]
    Write(PathBuf, #[source] io::Error),

    #[error("invalid pattern `{0}`")]
    Pattern(String, #[source] glob::PatternError),
}

impl PipelineError {
    pub fn walk(path: &Path, message: impl fmt::Display) -> Self {
        Self::Walk {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

/// A per-file failure: the file produced no output, siblings were unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

impl FileFailure {
    pub fn new(path: &Path, message: impl fmt::Display) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}
