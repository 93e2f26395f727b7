//! Stylesheet compilation: Sass → CSS → prefixed, comment-free CSS.
//!
//! ```text
//! app.scss ──grass──▶ css ──lightningcss──▶ prefixed css (+ map)
//!                          (targets, minify)
//! ```
//!
//! grass emits no source map, so the map produced here points from the final
//! output back into the compiled (pre-prefix) CSS of the entry.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("{0}")]
    Sass(String),

    #[error("{0}")]
    Css(String),
}

/// Compiled stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOutput {
    pub css: String,
    /// Source map JSON, when enabled.
    pub map: Option<String>,
}

/// Per-run stylesheet compiler settings.
#[derive(Debug, Clone)]
pub struct StyleCompiler {
    load_paths: Vec<PathBuf>,
    targets: Targets,
    minify: bool,
    sourcemaps: bool,
}

impl StyleCompiler {
    pub fn new(load_paths: Vec<PathBuf>, browsers: Option<Browsers>) -> Self {
        Self {
            load_paths,
            targets: Targets {
                browsers,
                ..Targets::default()
            },
            minify: false,
            sourcemaps: false,
        }
    }

    pub fn minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    pub fn sourcemaps(mut self, sourcemaps: bool) -> Self {
        self.sourcemaps = sourcemaps;
        self
    }

    /// Compile one entry stylesheet.
    pub fn compile(&self, path: &Path) -> Result<StyleOutput, StyleError> {
        let css = self.compile_sass(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.process(&css, &name)
    }

    fn compile_sass(&self, path: &Path) -> Result<String, StyleError> {
        let mut options = grass::Options::default().style(grass::OutputStyle::Expanded);
        if let Some(dir) = path.parent() {
            options = options.load_path(dir);
        }
        for load_path in &self.load_paths {
            options = options.load_path(load_path);
        }
        grass::from_path(path, &options).map_err(|e| StyleError::Sass(e.to_string()))
    }

    /// Prefix for the configured targets, drop comments, optionally minify.
    pub fn process(&self, css: &str, name: &str) -> Result<StyleOutput, StyleError> {
        let mut stylesheet = StyleSheet::parse(
            css,
            ParserOptions {
                filename: name.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| StyleError::Css(e.to_string()))?;

        stylesheet
            .minify(MinifyOptions {
                targets: self.targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| StyleError::Css(e.to_string()))?;
        stylesheet.license_comments.clear();

        let mut source_map = self.sourcemaps.then(|| {
            let mut map = SourceMap::new("/");
            map.add_source(name);
            map
        });
        if let Some(map) = source_map.as_mut() {
            map.set_source_content(0, css)
                .map_err(|e| StyleError::Css(e.to_string()))?;
        }

        let result = stylesheet
            .to_css(PrinterOptions {
                minify: self.minify,
                source_map: source_map.as_mut(),
                targets: self.targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| StyleError::Css(e.to_string()))?;

        let map = match source_map.as_mut() {
            Some(map) => Some(
                map.to_json(None)
                    .map_err(|e| StyleError::Css(e.to_string()))?,
            ),
            None => None,
        };

        Ok(StyleOutput {
            css: result.code,
            map,
        })
    }
}

/// Append the `sourceMappingURL` comment pointing at `map_name`.
pub fn link_source_map(css: &str, map_name: &str) -> String {
    format!("{css}\n/*# sourceMappingURL={map_name} */\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn legacy_targets() -> Option<Browsers> {
        Browsers::from_browserslist(["ios >= 7", "android >= 4.1"]).unwrap()
    }

    #[test]
    fn test_sass_partials_and_variables() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_vars.scss"), "$brand: #ff0000;").unwrap();
        fs::write(
            dir.path().join("app.scss"),
            "@import 'vars';\n// line comment\n.a { .b { color: $brand; } }",
        )
        .unwrap();

        let out = StyleCompiler::new(Vec::new(), None)
            .compile(&dir.path().join("app.scss"))
            .unwrap();
        assert!(out.css.contains(".a .b"));
        assert!(out.css.contains("red") || out.css.contains("#f00"));
        assert!(out.map.is_none());
    }

    #[test]
    fn test_prefixes_for_legacy_targets() {
        let out = StyleCompiler::new(Vec::new(), legacy_targets())
            .process(".x { display: flex; user-select: none; }", "app.css")
            .unwrap();
        assert!(out.css.contains("-webkit-"), "{}", out.css);
    }

    #[test]
    fn test_comments_stripped() {
        let out = StyleCompiler::new(Vec::new(), None)
            .process("/* note */ .x { color: red; } /*! keep? */", "app.css")
            .unwrap();
        assert!(!out.css.contains("note"));
        assert!(!out.css.contains("keep"));
    }

    #[test]
    fn test_minify_and_map() {
        let out = StyleCompiler::new(Vec::new(), None)
            .minify(true)
            .sourcemaps(true)
            .process(".x {\n  color: red;\n}\n", "app.css")
            .unwrap();
        assert_eq!(out.css, ".x{color:red}");
        let map: serde_json::Value = serde_json::from_str(&out.map.unwrap()).unwrap();
        assert_eq!(map["version"], 3);
    }

    #[test]
    fn test_syntax_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.scss"), ".a { color: ").unwrap();
        let err = StyleCompiler::new(Vec::new(), None)
            .compile(&dir.path().join("bad.scss"))
            .unwrap_err();
        assert!(matches!(err, StyleError::Sass(_)));
    }

    #[test]
    fn test_link_source_map() {
        assert_eq!(
            link_source_map("a{}", "app.css.map"),
            "a{}\n/*# sourceMappingURL=app.css.map */\n"
        );
    }
}
