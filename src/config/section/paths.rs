//! `[paths]` section configuration.
//!
//! Roots of the three trees and the per-kind directory names inside them.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! source = "src"
//! staging = "temp"
//! dist = "dist"
//! rev = "rev"
//!
//! [paths.source_dirs]
//! styles = "scss"
//!
//! [paths.dist_dirs]
//! fonts = "fonts"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::AssetKind;

/// Directory layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source tree root (read-only input).
    pub source: PathBuf,
    /// Staging tree root (development output, served by `dev`).
    pub staging: PathBuf,
    /// Distribution tree root (production output).
    pub dist: PathBuf,
    /// Manifest directory name inside the distribution tree.
    pub rev: PathBuf,
    /// Per-kind directory names under `source`.
    pub source_dirs: KindDirs,
    /// Per-kind directory names under `staging`.
    pub staging_dirs: KindDirs,
    /// Per-kind directory names under `dist`.
    pub dist_dirs: KindDirs,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: "src".into(),
            staging: "temp".into(),
            dist: "dist".into(),
            rev: "rev".into(),
            source_dirs: KindDirs {
                html: "html".into(),
                styles: "sass".into(),
                scripts: "js".into(),
                images: "images".into(),
                fonts: "font".into(),
                lib: "lib".into(),
            },
            staging_dirs: KindDirs {
                html: "html".into(),
                styles: "css".into(),
                scripts: "js".into(),
                images: "images".into(),
                fonts: "font".into(),
                lib: "lib".into(),
            },
            dist_dirs: KindDirs {
                html: "html".into(),
                styles: "css".into(),
                scripts: "js".into(),
                images: "images".into(),
                fonts: "fonts".into(),
                lib: "lib".into(),
            },
        }
    }
}

/// One directory name per asset kind.
///
/// Missing keys fall back to the kind's own name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KindDirs {
    pub html: String,
    pub styles: String,
    pub scripts: String,
    pub images: String,
    pub fonts: String,
    pub lib: String,
}

impl Default for KindDirs {
    fn default() -> Self {
        Self {
            html: AssetKind::Html.name().into(),
            styles: AssetKind::Style.name().into(),
            scripts: AssetKind::Script.name().into(),
            images: AssetKind::Image.name().into(),
            fonts: AssetKind::Font.name().into(),
            lib: AssetKind::Lib.name().into(),
        }
    }
}

impl KindDirs {
    /// Directory name for `kind`.
    pub fn get(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Html => &self.html,
            AssetKind::Style => &self.styles,
            AssetKind::Script => &self.scripts,
            AssetKind::Image => &self.images,
            AssetKind::Font => &self.fonts,
            AssetKind::Lib => &self.lib,
        }
    }

    /// Iterate `(kind, dir)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (AssetKind, &str)> {
        AssetKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}
