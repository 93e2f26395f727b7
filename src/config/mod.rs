//! Project configuration management for `ferrule.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── paths      # [paths]
//! │   ├── markup     # [markup]
//! │   ├── styles     # [styles]
//! │   ├── scripts    # [scripts]
//! │   ├── fingerprint# [fingerprint]
//! │   └── serve      # [serve]
//! ├── error          # ConfigError, ConfigDiagnostics
//! ├── util           # config file discovery
//! └── mod.rs         # FerruleConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section          | Purpose                                           |
//! |------------------|---------------------------------------------------|
//! | `[paths]`        | Source, staging and dist roots, per-kind dirs     |
//! | `[markup]`       | Include directive prefix, partials directory      |
//! | `[styles]`       | Browser targets, source maps, Sass load paths     |
//! | `[scripts]`      | Downlevel target, minification, source maps       |
//! | `[fingerprint]`  | Per-kind content-hash naming in production        |
//! | `[serve]`        | Development server and live reload                |
//!
//! The file is optional: without one every section takes its defaults and the
//! project root is the current directory.

pub mod section;
mod error;
mod util;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use section::{
    FingerprintConfig, KindDirs, MarkupConfig, PathsConfig, ScriptsConfig, ServeConfig,
    StylesConfig,
};
pub use util::is_within;

use util::find_config_file;

use crate::cli::{Cli, Commands, ServeArgs};
use crate::core::{AssetKind, Profile};
use crate::log;
use crate::utils::path::normalize_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Name of the per-kind manifest file.
pub const MANIFEST_FILE: &str = "rev-manifest.json";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing ferrule.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FerruleConfig {
    /// Directory holding `ferrule.toml`, or the cwd when there is none.
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub markup: MarkupConfig,

    #[serde(default)]
    pub styles: StylesConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl FerruleConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's parent directory, or cwd when no file exists.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let root = path.parent().map_or(cwd, Path::to_path_buf);
                Self::from_path(&path)?.with_root(&normalize_path(&root))
            }
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                Self::default().with_root(&cwd)
            }
        };

        if let Commands::Dev { serve_args } = cli.command() {
            config.apply_serve_args(&serve_args);
        }
        config.validate()?;

        Ok(config)
    }

    pub fn with_root(mut self, root: &Path) -> Self {
        self.root = root.to_path_buf();
        self
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} (ignored):", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// `dev --interface/--port` win over `[serve]`.
    fn apply_serve_args(&mut self, args: &ServeArgs) {
        if let Some(interface) = args.interface {
            self.serve.interface = interface;
        }
        if let Some(port) = args.port {
            self.serve.port = port;
        }
    }

    // ========================================================================
    // path accessors
    // ========================================================================

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Get path relative to the project root (for display).
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    pub fn source_root(&self) -> PathBuf {
        self.root_join(&self.paths.source)
    }

    pub fn staging_root(&self) -> PathBuf {
        self.root_join(&self.paths.staging)
    }

    pub fn dist_root(&self) -> PathBuf {
        self.root_join(&self.paths.dist)
    }

    /// Source directory of `kind`, e.g. `<root>/src/sass`.
    pub fn source_dir(&self, kind: AssetKind) -> PathBuf {
        self.source_root().join(self.paths.source_dirs.get(kind))
    }

    /// Output tree root for `profile`: staging in development, dist in production.
    pub fn output_root(&self, profile: Profile) -> PathBuf {
        if profile.is_production() {
            self.dist_root()
        } else {
            self.staging_root()
        }
    }

    /// Output directory of `kind` for `profile`.
    pub fn output_dir(&self, kind: AssetKind, profile: Profile) -> PathBuf {
        let dirs = if profile.is_production() {
            &self.paths.dist_dirs
        } else {
            &self.paths.staging_dirs
        };
        self.output_root(profile).join(dirs.get(kind))
    }

    /// Directory holding every manifest, e.g. `<root>/dist/rev`.
    pub fn rev_root(&self) -> PathBuf {
        self.dist_root().join(&self.paths.rev)
    }

    /// Manifest path of `kind`, e.g. `<root>/dist/rev/css/rev-manifest.json`.
    pub fn manifest_path(&self, kind: AssetKind) -> PathBuf {
        self.rev_root()
            .join(self.paths.dist_dirs.get(kind))
            .join(MANIFEST_FILE)
    }

    /// Sass load paths: the style source root plus configured extras.
    pub fn style_load_paths(&self) -> Vec<PathBuf> {
        std::iter::once(self.source_dir(AssetKind::Style))
            .chain(self.styles.load_paths.iter().map(|p| self.root_join(p)))
            .collect()
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.validate_roots(&mut diag);
        self.markup.validate(&mut diag);
        self.styles.validate(&mut diag);
        self.scripts.validate(&mut diag);
        self.fingerprint.validate(&mut diag);
        self.serve.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Output trees must never overlap the source tree: `clean` deletes them.
    fn validate_roots(&self, diag: &mut ConfigDiagnostics) {
        let source = self.source_root();
        for (field, output) in [
            ("paths.staging", self.staging_root()),
            ("paths.dist", self.dist_root()),
        ] {
            if is_within(&source, &output) || is_within(&output, &source) {
                diag.error_with_hint(
                    field,
                    format!(
                        "`{}` overlaps the source tree `{}`",
                        output.display(),
                        source.display()
                    ),
                    "output trees are deleted by `clean`, keep them beside `src`",
                );
            }
        }
        if self.staging_root() == self.dist_root() {
            diag.error("paths.dist", "staging and dist must be different directories");
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from TOML, rooted at `/project`.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> FerruleConfig {
    let (parsed, ignored) = FerruleConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed.with_root(Path::new("/project"))
}

/// Default config rooted at a real directory (for filesystem tests).
#[cfg(test)]
pub fn test_config_at(root: &Path) -> FerruleConfig {
    FerruleConfig::default().with_root(root)
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = FerruleConfig::parse_with_ignored("[paths\nsource = \"src\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[serve]\nport = 9000\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = FerruleConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.serve.port, 9000);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_default_layout() {
        let config = test_parse_config("");
        let root = Path::new("/project");

        assert_eq!(config.source_dir(AssetKind::Style), root.join("src/sass"));
        assert_eq!(
            config.output_dir(AssetKind::Style, Profile::DEVELOPMENT),
            root.join("temp/css")
        );
        assert_eq!(
            config.output_dir(AssetKind::Font, Profile::DEVELOPMENT),
            root.join("temp/font")
        );
        assert_eq!(
            config.output_dir(AssetKind::Font, Profile::PRODUCTION),
            root.join("dist/fonts")
        );
        assert_eq!(
            config.manifest_path(AssetKind::Script),
            root.join("dist/rev/js/rev-manifest.json")
        );
    }

    #[test]
    fn test_validate_defaults_ok() {
        assert!(test_parse_config("").validate().is_ok());
    }

    #[test]
    fn test_validate_overlapping_roots() {
        let config = test_parse_config("[paths]\nstaging = \"src/out\"\ndist = \"src/dist\"");
        let err = config.validate().unwrap_err();
        let diag = match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::Diagnostics(d)) => d,
            other => panic!("unexpected error {other:?}"),
        };
        assert_eq!(diag.len(), 2);
    }

    #[test]
    fn test_style_load_paths() {
        let config = test_parse_config("[styles]\nload_paths = [\"node_modules\"]");
        assert_eq!(
            config.style_load_paths(),
            vec![
                PathBuf::from("/project/src/sass"),
                PathBuf::from("/project/node_modules")
            ]
        );
    }
}
