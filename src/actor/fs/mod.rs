//! FileSystem Actor
//!
//! Watches one tree and turns debounced changes into messages. Two instances
//! run in serve mode:
//!
//! ```text
//! src/  → Debouncer → classify_sources → BuildMsg per kind
//! temp/ → Debouncer → classify_staging → WsMsg::Reload
//! ```
//!
//! The watcher is attached in `new`, before the initial compile finishes, so
//! nothing written in between is lost. Batches are only released once the
//! server is serving.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::builder::BuilderHandles;
use super::messages::{BuildMsg, WsMsg};
use crate::config::FerruleConfig;

// Business classification (raw changes -> actionable work).
mod classifier;
// Pure timing and deduplication.
mod debouncer;
// Shared fs event types.
mod types;


use debouncer::Debouncer;
use types::Changes;

/// Poll interval while the initial compile is still running.
const STARTUP_POLL: Duration = Duration::from_millis(100);

/// Where a watched tree's changes go.
pub enum Route {
    /// Source tree: rerun the pipelines of the changed kinds.
    Sources(BuilderHandles),
    /// Staging tree: reload connected browsers.
    Staging(mpsc::Sender<WsMsg>),
}

impl Route {
    fn name(&self) -> &'static str {
        match self {
            Self::Sources(_) => "sources",
            Self::Staging(_) => "staging",
        }
    }
}

/// FileSystem Actor - watches one directory tree
pub struct FsActor {
    /// Sync channel fed by the notify callback
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    root: PathBuf,
    route: Route,
    debouncer: Debouncer,
    config: Arc<FerruleConfig>,
}

impl FsActor {
    /// Start watching `root` immediately; events buffer until `run`.
    pub fn new(root: PathBuf, route: Route, config: Arc<FerruleConfig>) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        crate::debug!("watch"; "{}: {}", route.name(), root.display());

        let window = Duration::from_millis(config.serve.debounce_ms);
        Ok(Self {
            notify_rx,
            watcher,
            root,
            route,
            debouncer: Debouncer::new(window),
            config,
        })
    }

    /// Run the actor event loop until the receiving side goes away.
    pub async fn run(self) {
        let Self {
            notify_rx,
            watcher,
            root,
            route,
            mut debouncer,
            config,
        } = self;
        // dropping the watcher would end the event stream
        let _watcher = watcher;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            let mut wait = debouncer.sleep_duration();
            if !crate::core::is_serving() {
                wait = wait.max(STARTUP_POLL);
            }
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => debouncer.add_event(&event),
                    None => break,
                },
                _ = tokio::time::sleep(wait) => {
                    // keep events buffered until the initial compile is done
                    if !crate::core::is_serving() {
                        continue;
                    }
                    let Some(changes) = debouncer.take_if_ready() else {
                        continue;
                    };
                    if dispatch(changes, &route, &root, &config).await.is_err() {
                        break;
                    }
                }
            }
        }
        crate::debug!("watch"; "{} watcher stopped", route.name());
    }
}

/// Route one batch. `Err` means the receiving actor is gone.
async fn dispatch(
    changes: Changes,
    route: &Route,
    root: &std::path::Path,
    config: &FerruleConfig,
) -> Result<(), ()> {
    match route {
        Route::Sources(builders) => {
            for (kind, changed) in classifier::classify_sources(changes, config) {
                crate::debug!("watch"; "{}: {} change(s)", kind, changed.len());
                if let Some(tx) = builders.get(&kind) {
                    tx.send(BuildMsg::Rebuild { changed }).await.map_err(|_| ())?;
                }
            }
        }
        Route::Staging(ws_tx) => {
            let reload = classifier::classify_staging(changes, config);
            let Some(first) = reload.first() else {
                return Ok(());
            };
            let shown = first.strip_prefix(root).unwrap_or(first).display().to_string();
            let reason = match reload.len() {
                1 => shown,
                n => format!("{shown} (+{})", n - 1),
            };
            crate::debug!("reload"; "{}", reason);
            ws_tx.send(WsMsg::Reload { reason }).await.map_err(|_| ())?;
        }
    }
    Ok(())
}
