//! Debounced changes → actionable work.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::types::{ChangeKind, Changes};
use crate::config::FerruleConfig;
use crate::core::AssetKind;

/// Group source changes by the asset kind whose pipeline must rerun.
///
/// Paths outside every kind's source dir, or with an extension the kind does
/// not watch, are dropped.
pub(super) fn classify_sources(
    changes: Changes,
    config: &FerruleConfig,
) -> BTreeMap<AssetKind, Vec<PathBuf>> {
    let dirs: Vec<_> = AssetKind::ALL
        .into_iter()
        .map(|kind| (kind, config.source_dir(kind)))
        .collect();

    let mut grouped: BTreeMap<AssetKind, Vec<PathBuf>> = BTreeMap::new();
    for (path, change) in changes {
        let Some(kind) = kind_of(&path, &dirs) else {
            crate::debug!("watch"; "ignored {}: {}", change.label(), path.display());
            continue;
        };
        grouped.entry(kind).or_default().push(path);
    }
    for paths in grouped.values_mut() {
        paths.sort();
    }
    grouped
}

fn kind_of(path: &Path, dirs: &[(AssetKind, PathBuf)]) -> Option<AssetKind> {
    dirs.iter()
        .find(|(_, dir)| path.starts_with(dir))
        .map(|(kind, _)| *kind)
        .filter(|kind| kind.watches(path))
}

/// Staging files whose change should reload the page, sorted.
///
/// Removals are skipped: a vanished output has nothing new to show.
pub(super) fn classify_staging(changes: Changes, config: &FerruleConfig) -> Vec<PathBuf> {
    let mut reload: Vec<_> = changes
        .into_iter()
        .filter(|(path, change)| *change != ChangeKind::Removed && config.serve.reloads(path))
        .map(|(path, _)| path)
        .collect();
    reload.sort();
    reload
}
