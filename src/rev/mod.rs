//! Fingerprint manifests and reference rewriting for production output.

mod collect;
mod manifest;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::PipelineError;

pub use collect::{Rewriter, collect, rewrite_references};
pub use manifest::Manifest;

#[derive(Debug, Error)]
pub enum RevError {
    #[error("cannot read `{}`", .0.display())]
    Read(PathBuf, #[source] io::Error),

    #[error("cannot write `{}`", .0.display())]
    Write(PathBuf, #[source] io::Error),

    #[error("invalid manifest `{}`", .0.display())]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("cannot walk `{}`: {}", .0.display(), .1)]
    Walk(PathBuf, String),

    #[error(transparent)]
    Scan(#[from] PipelineError),
}
