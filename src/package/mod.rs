//! Production packaging.
//!
//! ```text
//! dist:clean   delete dist/
//! dist:assets  six pipelines, Production profile, in parallel
//!              └─▶ dist/rev/<dir>/rev-manifest.json per fingerprinted kind
//! dist:rev     dist/html/**/*.html references → fingerprinted names
//! ```
//!
//! Names are content-addressed and manifests sorted, so packaging unchanged
//! sources twice gives byte-identical trees.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::FerruleConfig;
use crate::core::{AssetKind, Profile};
use crate::log;
use crate::pipeline::{PipelineReport, run_all};
use crate::rev::{self, Manifest};
use crate::task::clean_dir;

/// Reports of one production run, in build order.
#[derive(Debug, Default)]
pub struct Assets {
    pub reports: Vec<(AssetKind, PipelineReport)>,
}

impl Assets {
    pub fn failures(&self) -> usize {
        self.reports.iter().map(|(_, r)| r.failures.len()).sum()
    }
}

/// Remove the dist tree, so files from earlier builds cannot linger.
pub fn clean_dist(config: &FerruleConfig) -> Result<bool> {
    let dist = config.dist_root();
    let removed = clean_dir(&dist, &config.source_root())?;
    Ok(removed)
}

/// Run every pipeline with the Production profile and write the manifests.
pub fn build_assets(config: &FerruleConfig, progress: bool) -> Result<Assets> {
    let reports = run_all(config, Profile::PRODUCTION, progress).context("production build")?;

    for (kind, report) in &reports {
        if !config.fingerprint.enabled(*kind) {
            continue;
        }
        let path = config.manifest_path(*kind);
        Manifest::from(report.manifest.clone()).write(&path)?;
        log!(kind.name(); "{} fingerprinted", report.manifest.len());
    }

    let assets = Assets { reports };
    if assets.failures() > 0 {
        log!("error"; "{} file(s) failed, see above", assets.failures());
    }
    Ok(assets)
}

/// Point every reference in the dist html at the fingerprinted names.
pub fn rewrite_html(config: &FerruleConfig) -> Result<Vec<PathBuf>> {
    let manifest = Manifest::load_dir(&config.rev_root())?;
    let html = config.output_dir(AssetKind::Html, Profile::PRODUCTION);
    let rewritten = rev::collect(&html, &manifest)?;
    Ok(rewritten)
}

#[cfg(test)]
mod tests;
