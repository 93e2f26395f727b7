//! Change detection: blake3 content hashes decide whether an output file
//! needs rewriting.

mod hash;
mod write;

pub use hash::{ContentHash, hash_bytes};
pub use write::{WriteOutcome, write_if_changed};
