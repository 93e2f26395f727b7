//! Configuration section definitions.
//!
//! Each module corresponds to a section in `ferrule.toml`:
//!
//! | Module        | TOML Section     | Purpose                           |
//! |---------------|------------------|-----------------------------------|
//! | `paths`       | `[paths]`        | Tree roots and per-kind dirs      |
//! | `markup`      | `[markup]`       | Include directives                |
//! | `styles`      | `[styles]`       | Prefix targets, source maps       |
//! | `scripts`     | `[scripts]`      | Downlevel target, minify          |
//! | `fingerprint` | `[fingerprint]`  | Content-hash names                |
//! | `serve`       | `[serve]`        | Development server                |

mod fingerprint;
mod markup;
mod paths;
mod scripts;
mod serve;
mod styles;

pub use fingerprint::FingerprintConfig;
pub use markup::MarkupConfig;
pub use paths::{KindDirs, PathsConfig};
pub use scripts::ScriptsConfig;
pub use serve::ServeConfig;
pub use styles::StylesConfig;
