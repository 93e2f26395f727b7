//! Source asset discovery and output naming.

mod fingerprint;
mod scan;

pub use fingerprint::{fingerprint_path, manifest_key};
pub use scan::FileSet;
