//! Embedded static resources.
//!
//! - `template` - typed placeholder substitution
//! - `serve` - dev-server client (hotreload.js, minified by `build.rs`)

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// URL the injected `<script>` loads the client from.
    pub const HOTRELOAD_URL: &str = "/__ferrule/hotreload.js";

    /// Variables for hotreload.js.
    pub struct HotreloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for HotreloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__FERRULE_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live-reload client with WebSocket port injection.
    pub const HOTRELOAD_JS: Template<HotreloadVars> =
        Template::new(include_str!(concat!(env!("OUT_DIR"), "/hotreload.min.js")));

    /// Tag inserted into served HTML pages.
    pub fn script_tag() -> String {
        format!(r#"<script src="{HOTRELOAD_URL}" defer></script>"#)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotreload_js_with_port() {
        let rendered = serve::HOTRELOAD_JS.render(&serve::HotreloadVars { ws_port: 35730 });
        assert!(rendered.contains("35730"));
        assert!(!rendered.contains("__FERRULE_WS_PORT__"));
        assert!(!rendered.contains("__FERRULE_OVERLAY_CSS__"));
    }

    #[test]
    fn test_script_tag() {
        assert_eq!(
            serve::script_tag(),
            r#"<script src="/__ferrule/hotreload.js" defer></script>"#
        );
    }
}
