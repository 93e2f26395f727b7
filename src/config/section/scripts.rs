//! `[scripts]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [scripts]
//! target = "es2015"   # Syntax level for first-party modules
//! minify = true       # Compress + mangle bundles
//! sourcemaps = true
//! ```

use oxc::transformer::TransformOptions;
use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Script pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Downlevel target (`es2015` .. `esnext`).
    pub target: String,
    /// Minify bundles in every profile.
    pub minify: bool,
    /// Emit `name.js.map` next to every bundle.
    pub sourcemaps: bool,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            target: "es2015".into(),
            minify: true,
            sourcemaps: true,
        }
    }
}

impl ScriptsConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Err(e) = TransformOptions::from_target(&self.target) {
            diag.error_with_hint(
                "scripts.target",
                e,
                "use an ECMAScript version such as `es2015` or `es2020`",
            );
        }
    }
}
