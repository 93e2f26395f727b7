//! Rewriting references to fingerprinted files.
//!
//! Every occurrence of a manifest key, or of an earlier fingerprinted form of
//! it, is replaced by the current fingerprinted name:
//!
//! ```text
//! <link href="../css/app.css">            -> ../css/app.1a2b3c4d.css
//! <link href="../css/app.9f8e7d6c.css">   -> ../css/app.1a2b3c4d.css
//! <link href="../css/myapp.css">          -> unchanged (not a whole name)
//! ```

use rayon::prelude::*;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{Manifest, RevError};
use crate::asset::FileSet;
use crate::freshness::write_if_changed;

/// Characters that continue a file name; a match must not touch one on either side.
fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Split `dir/stem.ext` into (`dir/stem`, `.ext`); no extension gives (`name`, ``).
fn split_ext(name: &str) -> (&str, &str) {
    let file_start = name.rfind('/').map_or(0, |i| i + 1);
    match name[file_start..].rfind('.') {
        Some(0) | None => (name, ""),
        Some(dot) => name.split_at(file_start + dot),
    }
}

/// Compiled matcher for every name in a manifest.
pub struct Rewriter {
    pattern: Option<Regex>,
    /// Any matchable spelling → current fingerprinted name.
    exact: FxHashMap<String, String>,
    /// `(stem, ext, hash length)` → current fingerprinted name.
    hashed: FxHashMap<(String, String), (usize, String)>,
}

impl Rewriter {
    pub fn new(manifest: &Manifest) -> Self {
        let mut alternatives = Vec::new();
        let mut exact = FxHashMap::default();
        let mut hashed = FxHashMap::default();

        for (original, named) in manifest.iter() {
            let (stem, ext) = split_ext(original);
            let hash_len = named.len().saturating_sub(original.len() + 1);
            alternatives.push(regex::escape(original));
            if hash_len > 0 {
                alternatives.push(format!(
                    "{}\\.[0-9a-f]{{{hash_len}}}{}",
                    regex::escape(stem),
                    regex::escape(ext)
                ));
                hashed.insert((stem.to_string(), ext.to_string()), (hash_len, named.to_string()));
            }
            exact.insert(original.to_string(), named.to_string());
        }

        // longest first so `a.min.js` wins over `a.js`-style prefixes
        alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let pattern = (!alternatives.is_empty())
            .then(|| Regex::new(&alternatives.join("|")).expect("escaped names form a valid pattern"));

        Self {
            pattern,
            exact,
            hashed,
        }
    }

    fn replacement(&self, matched: &str) -> Option<&str> {
        if let Some(named) = self.exact.get(matched) {
            return Some(named);
        }
        // `stem.<hash>.ext`: drop the hash segment and look the name up
        let (rest, ext) = split_ext(matched);
        let (stem, hash) = split_ext(rest);
        let (len, named) = self.hashed.get(&(stem.to_string(), ext.to_string()))?;
        (hash.len() == len + 1).then_some(named.as_str())
    }

    /// Rewrite every whole-name reference in `text`.
    pub fn rewrite(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };

        let mut out = String::with_capacity(text.len());
        let mut copied = 0;
        let mut pos = 0;
        while let Some(m) = pattern.find_at(text, pos) {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            let bounded = !before.is_some_and(is_name_char) && !after.is_some_and(is_name_char);

            match self.replacement(m.as_str()).filter(|_| bounded) {
                Some(named) => {
                    out.push_str(&text[copied..m.start()]);
                    out.push_str(named);
                    copied = m.end();
                    pos = m.end();
                }
                None => {
                    pos = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
                }
            }
            if pos >= text.len() {
                break;
            }
        }
        out.push_str(&text[copied..]);
        out
    }
}

/// Rewrite references to `manifest` names in `text`. Idempotent.
pub fn rewrite_references(text: &str, manifest: &Manifest) -> String {
    Rewriter::new(manifest).rewrite(text)
}

/// Rewrite every `.html` file under `html_dir` in place.
///
/// Returns the files whose content changed.
pub fn collect(html_dir: &Path, manifest: &Manifest) -> Result<Vec<PathBuf>, RevError> {
    let files = FileSet::new(html_dir).include("**/*.html").resolve()?;
    let rewriter = Rewriter::new(manifest);

    let outcomes = files
        .par_iter()
        .map(|path| -> Result<_, RevError> {
            let text =
                fs::read_to_string(path).map_err(|e| RevError::Read(path.clone(), e))?;
            let rewritten = rewriter.rewrite(&text);
            let outcome = write_if_changed(path, rewritten.as_bytes())
                .map_err(|e| RevError::Write(path.clone(), e))?;
            Ok((path, outcome))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(outcomes
        .into_iter()
        .filter(|(_, outcome)| outcome.is_written())
        .map(|(path, _)| path.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest() -> Manifest {
        [
            ("app.css", "app.1a2b3c4d.css"),
            ("app.js", "app.99887766.js"),
            ("vendor/jquery.min.js", "vendor/jquery.min.0f0f0f0f.js"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_split_ext() {
        assert_eq!(split_ext("app.css"), ("app", ".css"));
        assert_eq!(split_ext("vendor/jquery.min.js"), ("vendor/jquery.min", ".js"));
        assert_eq!(split_ext("LICENSE"), ("LICENSE", ""));
        assert_eq!(split_ext("a.b/LICENSE"), ("a.b/LICENSE", ""));
    }

    #[test]
    fn test_rewrite_original_names() {
        let html = r#"<link href="../css/app.css"><script src="../js/app.js"></script>"#;
        assert_eq!(
            rewrite_references(html, &manifest()),
            r#"<link href="../css/app.1a2b3c4d.css"><script src="../js/app.99887766.js"></script>"#
        );
    }

    #[test]
    fn test_rewrite_previous_fingerprint() {
        let html = r#"<link href="/css/app.00000000.css">"#;
        assert_eq!(
            rewrite_references(html, &manifest()),
            r#"<link href="/css/app.1a2b3c4d.css">"#
        );
    }

    #[test]
    fn test_partial_names_untouched() {
        let html = "myapp.css app.css.map app.cssx webapp.js ../lib/vendor/jquery.min.js";
        assert_eq!(
            rewrite_references(html, &manifest()),
            "myapp.css app.css.map app.cssx webapp.js ../lib/vendor/jquery.min.0f0f0f0f.js"
        );
    }

    #[test]
    fn test_idempotent() {
        let html = "<a href='app.css'>app.js</a> app.deadbeef.css";
        let once = rewrite_references(html, &manifest());
        assert_eq!(rewrite_references(&once, &manifest()), once);
    }

    #[test]
    fn test_empty_manifest() {
        assert_eq!(rewrite_references("app.css", &Manifest::new()), "app.css");
    }

    #[test]
    fn test_collect_in_place() {
        let dir = TempDir::new().unwrap();
        let html = dir.path().join("html");
        fs::create_dir_all(html.join("about")).unwrap();
        fs::write(html.join("index.html"), "<link href='../css/app.css'>").unwrap();
        fs::write(html.join("about/index.html"), "<p>no assets</p>").unwrap();

        let changed = collect(&html, &manifest()).unwrap();
        assert_eq!(changed, [html.join("index.html")]);
        assert_eq!(
            fs::read_to_string(html.join("index.html")).unwrap(),
            "<link href='../css/app.1a2b3c4d.css'>"
        );
        assert!(collect(&html, &manifest()).unwrap().is_empty());
    }
}
