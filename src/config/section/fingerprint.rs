//! `[fingerprint]` section configuration.
//!
//! Content-hash naming in production builds (`app.css` → `app.1a2b3c4d.css`).
//!
//! # Example
//!
//! ```toml
//! [fingerprint]
//! styles = true
//! scripts = true
//! images = false
//! fonts = false
//! lib = false
//! length = 8
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::core::AssetKind;

/// Per-kind fingerprint toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    pub styles: bool,
    pub scripts: bool,
    pub images: bool,
    pub fonts: bool,
    pub lib: bool,
    /// Number of hex characters in the hash segment.
    pub length: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            styles: true,
            scripts: true,
            images: false,
            fonts: false,
            lib: false,
            length: 8,
        }
    }
}

impl FingerprintConfig {
    /// Whether `kind` gets content-hashed names. Markup never does.
    pub fn enabled(&self, kind: AssetKind) -> bool {
        match kind {
            AssetKind::Html => false,
            AssetKind::Style => self.styles,
            AssetKind::Script => self.scripts,
            AssetKind::Image => self.images,
            AssetKind::Font => self.fonts,
            AssetKind::Lib => self.lib,
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !(4..=64).contains(&self.length) {
            diag.error_with_hint(
                "fingerprint.length",
                format!("{} is out of range", self.length),
                "use a value between 4 and 64",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};
    use crate::core::AssetKind;

    #[test]
    fn test_fingerprint_defaults() {
        let config = test_parse_config("");
        assert!(config.fingerprint.enabled(AssetKind::Style));
        assert!(config.fingerprint.enabled(AssetKind::Script));
        assert!(!config.fingerprint.enabled(AssetKind::Image));
        assert!(!config.fingerprint.enabled(AssetKind::Html));
        assert_eq!(config.fingerprint.length, 8);
    }

    #[test]
    fn test_fingerprint_copy_kinds_opt_in() {
        let config = test_parse_config("[fingerprint]\nimages = true");
        assert!(config.fingerprint.enabled(AssetKind::Image));
        assert!(!config.fingerprint.enabled(AssetKind::Font));
    }

    #[test]
    fn test_fingerprint_length_range() {
        let config = test_parse_config("[fingerprint]\nlength = 2");
        let mut diag = ConfigDiagnostics::new();
        config.fingerprint.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
