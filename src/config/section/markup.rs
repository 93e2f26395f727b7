//! `[markup]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [markup]
//! prefix = "@@"          # Directive prefix: @@include(...), @@key
//! partials = "include"   # Directory of partials, never emitted as pages
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Include-expansion settings for the html pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Directive prefix.
    pub prefix: String,
    /// Partials directory, relative to the html source dir.
    pub partials: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            prefix: "@@".into(),
            partials: "include".into(),
        }
    }
}

impl MarkupConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.prefix.trim().is_empty() {
            diag.error("markup.prefix", "prefix must not be empty");
        }
        if self.prefix.chars().any(|c| c.is_alphanumeric() || c == '_') {
            diag.error_with_hint(
                "markup.prefix",
                format!("`{}` contains word characters", self.prefix),
                "use punctuation such as `@@`",
            );
        }
    }
}
