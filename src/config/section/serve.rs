//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 8091                 # HTTP port number
//! ws_port = 35729             # Live-reload WebSocket port
//! reload_extensions = ["html", "js", "png", "jpg", "ttf"]
//! debounce_ms = 300
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket port for live reload.
    pub ws_port: u16,

    /// Extensions in the staging tree that trigger a full page reload.
    pub reload_extensions: Vec<String>,

    /// Quiet window for coalescing file events.
    pub debounce_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8091,
            ws_port: 35729,
            reload_extensions: ["html", "js", "png", "jpg", "ttf"]
                .into_iter()
                .map(String::from)
                .collect(),
            debounce_ms: 300,
        }
    }
}

impl ServeConfig {
    /// Whether a changed staging file should trigger a full reload.
    pub fn reloads(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.reload_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port == 0 {
            diag.error("serve.port", "port must not be 0");
        }
        if self.ws_port == 0 {
            diag.error("serve.ws_port", "port must not be 0");
        }
        if self.port == self.ws_port {
            diag.error_with_hint(
                "serve.ws_port",
                format!("same as serve.port ({})", self.port),
                "the live-reload channel needs its own port",
            );
        }
        if self.reload_extensions.iter().any(|e| e.starts_with('.')) {
            diag.error_with_hint(
                "serve.reload_extensions",
                "extensions must not start with '.'",
                "write `html`, not `.html`",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
    use std::path::Path;

    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_serve_config() {
        let config = test_parse_config("[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nws_port = 9000");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.ws_port, 9000);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 8091);
        assert_eq!(config.serve.ws_port, 35729);
        assert_eq!(config.serve.debounce_ms, 300);
    }

    #[test]
    fn test_serve_config_ipv6() {
        let config = test_parse_config("[serve]\ninterface = \"::1\"");
        assert_eq!(
            config.serve.interface,
            IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    }

    #[test]
    fn test_reloads_default_extensions() {
        let config = test_parse_config("");
        assert!(config.serve.reloads(Path::new("temp/html/index.html")));
        assert!(config.serve.reloads(Path::new("temp/images/a.PNG")));
        assert!(!config.serve.reloads(Path::new("temp/css/app.css")));
        assert!(!config.serve.reloads(Path::new("temp/js/app.js.map")));
    }

    #[test]
    fn test_validate_port_clash() {
        let config = test_parse_config("[serve]\nport = 9000\nws_port = 9000");
        let mut diag = ConfigDiagnostics::new();
        config.serve.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
