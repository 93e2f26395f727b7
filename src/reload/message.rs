//! Live-reload message protocol.
//!
//! JSON messages pushed from the dev server to the browser, tagged by `type`:
//!
//! - `connected`: handshake done
//! - `reload`: full page reload
//! - `css`: re-fetch stylesheets in place
//! - `error`: show the build error overlay
//! - `clear_error`: hide the overlay

use serde::{Deserialize, Serialize};

/// Message sent over the live-reload WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HotReloadMessage {
    /// Connection established
    Connected {
        /// Server version, for client compatibility checks
        version: String,
    },

    /// Full page reload
    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Stylesheet-only refresh, no navigation
    Css {
        /// Changed stylesheets relative to the served root, e.g. `css/app.css`
        files: Vec<String>,
    },

    /// Build error (display overlay, no reload)
    Error { path: String, error: String },

    /// Clear error overlay (the failing kind rebuilt cleanly)
    ClearError,
}

impl HotReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn reload() -> Self {
        Self::Reload { reason: None }
    }

    pub fn reload_with_reason(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn css(files: Vec<String>) -> Self {
        Self::Css { files }
    }

    pub fn error(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Error {
            path: path.into(),
            error: error.into(),
        }
    }

    pub fn clear_error() -> Self {
        Self::ClearError
    }

    /// Serialize to JSON. Falls back to a bare reload if serialization fails.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_json() {
        assert_eq!(HotReloadMessage::reload().to_json(), r#"{"type":"reload"}"#);
        assert_eq!(
            HotReloadMessage::reload_with_reason("html/index.html").to_json(),
            r#"{"type":"reload","reason":"html/index.html"}"#
        );
    }

    #[test]
    fn test_css_json() {
        let json = HotReloadMessage::css(vec!["css/app.css".into()]).to_json();
        assert_eq!(json, r#"{"type":"css","files":["css/app.css"]}"#);
    }

    #[test]
    fn test_error_and_clear() {
        let json = HotReloadMessage::error("src/sass/app.scss", "expected \";\"").to_json();
        assert!(json.starts_with(r#"{"type":"error","path":"src/sass/app.scss""#));
        assert_eq!(HotReloadMessage::clear_error().to_json(), r#"{"type":"clear_error"}"#);
    }

    #[test]
    fn test_connected_carries_version() {
        let parsed: HotReloadMessage =
            serde_json::from_str(&HotReloadMessage::connected().to_json()).unwrap();
        assert_eq!(parsed, HotReloadMessage::connected());
    }
}
