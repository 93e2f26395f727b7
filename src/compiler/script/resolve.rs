//! Module specifier resolution.
//!
//! ```text
//! './util'        -> util, util.js, util.mjs, util/index.js
//! 'lodash-es'     -> node_modules/lodash-es/package.json  module | main | index.js
//! 'pkg/sub/file'  -> node_modules/pkg/sub/file(.js)
//! ```
//!
//! Bare specifiers are looked up in `node_modules` directories walking up from
//! the importing file, the way Node does.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSIONS: &[&str] = &["js", "mjs"];

/// Resolve `specifier` imported from a file in `from_dir`.
pub fn resolve(specifier: &str, from_dir: &Path) -> Option<PathBuf> {
    if is_relative(specifier) {
        return resolve_file(&from_dir.join(specifier));
    }

    let (package, subpath) = split_bare(specifier);
    for dir in from_dir.ancestors() {
        let package_dir = dir.join("node_modules").join(package);
        if !package_dir.is_dir() {
            continue;
        }
        return match subpath {
            Some(sub) => resolve_file(&package_dir.join(sub)),
            None => resolve_package(&package_dir),
        };
    }
    None
}

/// Whether the module lives in third-party code (never downleveled).
pub fn is_vendor(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str() == "node_modules")
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/')
}

/// `@scope/pkg/a/b` -> (`@scope/pkg`, Some(`a/b`)), `pkg` -> (`pkg`, None).
fn split_bare(specifier: &str) -> (&str, Option<&str>) {
    let name_segments = if specifier.starts_with('@') { 2 } else { 1 };
    let mut split_at = None;
    let mut seen = 0;
    for (i, c) in specifier.char_indices() {
        if c == '/' {
            seen += 1;
            if seen == name_segments {
                split_at = Some(i);
                break;
            }
        }
    }
    match split_at {
        Some(i) => (&specifier[..i], Some(&specifier[i + 1..])),
        None => (specifier, None),
    }
}

fn resolve_file(base: &Path) -> Option<PathBuf> {
    if base.is_file() {
        return Some(base.to_path_buf());
    }
    for ext in EXTENSIONS {
        let mut name = base.as_os_str().to_owned();
        name.push(".");
        name.push(ext);
        let candidate = PathBuf::from(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    if base.is_dir() {
        let index = base.join("index.js");
        if index.is_file() {
            return Some(index);
        }
    }
    None
}

/// Entry of a package directory: `module`, then `main`, then `index.js`.
fn resolve_package(dir: &Path) -> Option<PathBuf> {
    let manifest = fs::read_to_string(dir.join("package.json"))
        .ok()
        .and_then(|s| serde_json::from_str::<Value>(&s).ok());

    if let Some(manifest) = manifest {
        for field in ["module", "main"] {
            if let Some(entry) = manifest.get(field).and_then(Value::as_str)
                && let Some(path) = resolve_file(&dir.join(entry))
            {
                return Some(path);
            }
        }
    }

    resolve_file(&dir.join("index.js"))
}
