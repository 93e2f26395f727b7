//! Script bundling.
//!
//! ```text
//! entry.js ──graph──▶ modules (deps first, first-party downleveled)
//!          ──link───▶ one ES module
//!          ──emit───▶ minified code + source map
//! ```

mod graph;
mod helpers;
mod link;
mod module;
mod resolve;
mod transform;

use oxc::transformer::{HelperLoaderMode, TransformOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use transform::Emitted as ScriptOutput;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("cannot read `{}`", .0.display())]
    Read(PathBuf, #[source] std::io::Error),

    #[error("{}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("cannot resolve `{specifier}` imported from `{}`", .from.display())]
    Unresolved { specifier: String, from: PathBuf },

    #[error("`{name}` is not exported by `{specifier}` (imported from `{}`)", .from.display())]
    MissingExport {
        name: String,
        specifier: String,
        from: PathBuf,
    },

    #[error("import cycle: {}", format_cycle(.0))]
    Cycle(Vec<PathBuf>),

    #[error("{}: {message}", .path.display())]
    Transform { path: PathBuf, message: String },

    #[error("invalid script target `{target}`: {message}")]
    Target { target: String, message: String },
}

fn format_cycle(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Top-level `*.js` / `*.mjs` files of `dir`, sorted. A missing dir has none.
pub fn discover_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let read = match std::fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut entries = Vec::new();
    for entry in read {
        let path = entry?.path();
        let is_script = path
            .extension()
            .is_some_and(|ext| ext == "js" || ext == "mjs");
        if is_script && path.is_file() {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// Per-run script compiler settings.
pub struct ScriptCompiler {
    target: TransformOptions,
    minify: bool,
    sourcemaps: bool,
}

impl ScriptCompiler {
    pub fn new(target: &str) -> Result<Self, BundleError> {
        let mut target_options =
            TransformOptions::from_target(target).map_err(|message| BundleError::Target {
                target: target.to_string(),
                message,
            })?;
        // helpers are bundled, not imported from the npm runtime package
        target_options.helper_loader.mode = HelperLoaderMode::External;
        Ok(Self {
            target: target_options,
            minify: false,
            sourcemaps: false,
        })
    }

    pub fn minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    pub fn sourcemaps(mut self, sourcemaps: bool) -> Self {
        self.sourcemaps = sourcemaps;
        self
    }

    /// Bundle `entry` and everything it imports into one module.
    pub fn compile(&self, entry: &Path) -> Result<ScriptOutput, BundleError> {
        let graph = graph::ModuleGraph::build(entry, |path, code| {
            if resolve::is_vendor(path) {
                Ok(code)
            } else {
                transform::downlevel(path, &code, &self.target)
            }
        })?;
        let bundle = helpers::with_helpers(link::link(&graph)).map_err(|name| {
            BundleError::Transform {
                path: entry.to_path_buf(),
                message: format!("no bundled definition for transform helper `{name}`"),
            }
        })?;

        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        transform::emit(&bundle, &name, self.minify, self.sourcemaps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_discover_entries() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.js", "");
        write(dir.path(), "a.mjs", "");
        write(dir.path(), "notes.txt", "");
        write(dir.path(), "modules/inner.js", "");

        let names: Vec<_> = discover_entries(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.mjs", "b.js"]);
        assert!(discover_entries(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_bundle_with_vendor_package() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "node_modules/left-pad/package.json",
            r#"{"module": "index.mjs"}"#,
        );
        write(
            dir.path(),
            "node_modules/left-pad/index.mjs",
            "export default function pad(s) { return ' ' + s; }",
        );
        write(dir.path(), "src/js/modules/greet.js", "export const greet = (n) => `hi ${n}`;");
        let entry = write(
            dir.path(),
            "src/js/app.js",
            "import pad from 'left-pad';\nimport { greet } from './modules/greet';\ndocument.title = pad(greet('x'));",
        );

        let out = ScriptCompiler::new("es2015")
            .unwrap()
            .compile(&entry)
            .unwrap();
        assert!(!out.code.contains("import"));
        assert!(out.code.contains("document.title"));
        assert!(out.map.is_none());
    }

    #[test]
    fn test_minified_output_has_map() {
        let dir = TempDir::new().unwrap();
        let entry = write(
            dir.path(),
            "app.js",
            "const message = 'hello';\nconsole.log(message);\n",
        );

        let out = ScriptCompiler::new("es2015")
            .unwrap()
            .minify(true)
            .sourcemaps(true)
            .compile(&entry)
            .unwrap();
        assert!(out.code.contains("console.log"));
        assert!(out.map.is_some());
    }

    #[test]
    fn test_unresolved_is_error() {
        let dir = TempDir::new().unwrap();
        let entry = write(dir.path(), "app.js", "import x from 'nowhere';\nx();");
        let err = ScriptCompiler::new("es2015")
            .unwrap()
            .compile(&entry)
            .unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_lowered_syntax_needs_no_runtime_package() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/js/modules/store.js",
            "export class Store {\n  #items = [];\n  add(item) { this.#items.push(item); return this.#items.length; }\n}",
        );
        let entry = write(
            dir.path(),
            "src/js/app.js",
            "import { Store } from './modules/store';\n\
             async function load(url) { const res = await fetch(url); return res.json(); }\n\
             const base = { a: 1 };\n\
             const merged = { ...base, b: 2 };\n\
             load('/data.json').then((d) => new Store().add({ ...merged, d }));",
        );

        let out = ScriptCompiler::new("es2015")
            .unwrap()
            .compile(&entry)
            .unwrap();
        assert!(!out.code.contains("@oxc-project/runtime"));
        assert!(!out.code.contains("import "));
        assert!(!out.code.contains("async function"));
        for helper in ["asyncToGenerator", "objectSpread2", "classPrivateFieldInitSpec"] {
            assert!(out.code.contains(&format!("function _{helper}(")), "{helper} not bundled");
        }
    }

    #[test]
    fn test_import_of_missing_export_fails() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "dep.js", "export const a = 1;");
        let entry = write(dir.path(), "app.js", "import { nope } from './dep.js';\nconsole.log(nope);");

        let err = ScriptCompiler::new("es2015")
            .unwrap()
            .compile(&entry)
            .unwrap_err();
        assert!(
            matches!(&err, BundleError::MissingExport { name, specifier, .. } if name == "nope" && specifier == "./dep.js"),
            "{err}"
        );
    }

    #[test]
    fn test_invalid_target() {
        assert!(matches!(
            ScriptCompiler::new("es1999"),
            Err(BundleError::Target { .. })
        ));
    }
}
