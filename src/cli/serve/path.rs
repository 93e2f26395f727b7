//! URL to staging-file resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Where a request URL leads.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    /// Directory requested without trailing slash, or bare `/` with pages
    /// under `html/`.
    Redirect(String),
    NotFound,
}

/// Resolve `url` against `root`.
///
/// Directories serve their `index.html`. Paths containing `..` or escaping
/// `root` through a symlink are not found.
pub fn resolve(url: &str, root: &Path) -> Resolved {
    let Some(clean) = normalize_url(url) else {
        return Resolved::NotFound;
    };
    if clean.split('/').any(|part| part == "..") {
        return Resolved::NotFound;
    }

    let Ok(root) = root.canonicalize() else {
        return Resolved::NotFound;
    };
    let Ok(local) = root.join(&clean).canonicalize() else {
        return Resolved::NotFound;
    };
    if !local.starts_with(&root) {
        return Resolved::NotFound;
    }

    if local.is_file() {
        return Resolved::File(local);
    }
    if !local.is_dir() {
        return Resolved::NotFound;
    }

    let index = local.join("index.html");
    if index.is_file() {
        if !clean.is_empty() && !url_path(url).ends_with('/') {
            return Resolved::Redirect(format!("/{clean}/"));
        }
        return Resolved::File(index);
    }

    // the staging root has no pages of its own; send `/` to the html tree
    if clean.is_empty() && root.join("html/index.html").is_file() {
        return Resolved::Redirect("/html/".to_string());
    }
    Resolved::NotFound
}

fn url_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Decoded path without query, leading or trailing slashes.
fn normalize_url(url: &str) -> Option<String> {
    let decoded = percent_decode_str(url_path(url)).decode_utf8().ok()?;
    Some(decoded.trim_matches('/').to_string())
}
