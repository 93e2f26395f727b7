//! Core types - pure abstractions shared across the codebase.

mod kind;
mod profile;
mod state;

pub use kind::AssetKind;
pub use profile::Profile;
pub use state::{is_serving, is_shutdown, register_server, set_serving, setup_shutdown_handler};
