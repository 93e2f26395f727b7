use std::path::Path;
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::ModifyKind;

use super::types::{ChangeKind, Changes};
use crate::utils::path::normalize_path;

/// Minimum gap between two batches handed out by one debouncer.
pub(super) const BATCH_COOLDOWN_MS: u64 = 100;

/// Pure debouncer: timing and per-path deduplication, no classification.
pub(super) struct Debouncer {
    pub(super) changes: Changes,
    window: Duration,
    last_event: Option<Instant>,
    last_batch: Option<Instant>,
}

impl Debouncer {
    /// `window` is the quiet period required before a batch is released.
    pub(super) fn new(window: Duration) -> Self {
        Self {
            changes: Changes::default(),
            window,
            last_event: None,
            last_batch: None,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Remove + Create/Modify → Create/Modify (file was restored)
    /// - Modify + Remove → Remove (file was deleted)
    /// - Create + Remove → dropped (never existed as far as builds care)
    /// - otherwise the first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            // mtime/chmod noise, and our own writes touching metadata
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let path = normalize_path(path);

            match self.changes.get(&path).copied() {
                None => {
                    crate::debug!("watch"; "{}: {}", kind.label(), path.display());
                    self.changes.insert(path, kind);
                }
                Some(ChangeKind::Removed)
                    if matches!(kind, ChangeKind::Created | ChangeKind::Modified) =>
                {
                    self.changes.insert(path, kind);
                }
                Some(ChangeKind::Modified) if kind == ChangeKind::Removed => {
                    self.changes.insert(path, ChangeKind::Removed);
                }
                Some(ChangeKind::Created) if kind == ChangeKind::Removed => {
                    self.changes.remove(&path);
                }
                Some(_) => {}
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// Take the pending batch once the window and cooldown have elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<Changes> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.last_event = None;
        if changes.is_empty() {
            return None;
        }
        self.last_batch = Some(Instant::now());
        Some(changes)
    }

    /// Quiet window and cooldown have both elapsed since the last event.
    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        if last_event.elapsed() < self.window {
            return false;
        }
        if let Some(last_batch) = self.last_batch
            && last_batch.elapsed() < Duration::from_millis(BATCH_COOLDOWN_MS)
        {
            return false;
        }
        true
    }

    /// Sleep until the next moment a batch could become ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        let window_remaining = self.window.saturating_sub(last_event.elapsed());
        let cooldown_remaining = self
            .last_batch
            .map(|t| Duration::from_millis(BATCH_COOLDOWN_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        window_remaining
            .max(cooldown_remaining)
            .max(Duration::from_millis(1))
    }
}

/// Editor artifacts: backups, swap files, dotfiles.
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
