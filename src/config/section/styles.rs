//! `[styles]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [styles]
//! targets = ["ios >= 7", "android >= 4.1"]   # browserslist queries for prefixing
//! sourcemaps = true
//! load_paths = ["node_modules"]              # extra Sass @use/@import roots
//! ```

use lightningcss::targets::Browsers;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ConfigDiagnostics;

/// Stylesheet pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    /// Browserslist queries that decide which vendor prefixes are added.
    pub targets: Vec<String>,
    /// Emit `name.css.map` next to every stylesheet.
    pub sourcemaps: bool,
    /// Additional Sass load paths, relative to the project root.
    pub load_paths: Vec<PathBuf>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            targets: vec!["ios >= 7".into(), "android >= 4.1".into()],
            sourcemaps: true,
            load_paths: Vec::new(),
        }
    }
}

impl StylesConfig {
    /// Resolve `targets` into lightningcss browser versions.
    ///
    /// An empty list means no prefixing.
    pub fn browsers(&self) -> Result<Option<Browsers>, String> {
        if self.targets.is_empty() {
            return Ok(None);
        }
        Browsers::from_browserslist(self.targets.iter().map(String::as_str))
            .map_err(|e| e.to_string())
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Err(e) = self.browsers() {
            diag.error_with_hint(
                "styles.targets",
                e,
                "use browserslist queries such as `ios >= 7`",
            );
        }
        for path in &self.load_paths {
            if path.is_absolute() {
                diag.error(
                    "styles.load_paths",
                    format!("`{}` must be relative to the project root", path.display()),
                );
            }
        }
    }
}
