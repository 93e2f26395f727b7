use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::actor::builder::{BuildActor, BuilderHandles};
use crate::actor::fs::{FsActor, Route};
use crate::actor::messages::{BuildMsg, WsMsg};
use crate::actor::ws::WsActor;
use crate::config::FerruleConfig;
use crate::utils::path::normalize_path;

const POLL: Duration = Duration::from_millis(100);

pub(super) struct Actors {
    pub config: Arc<FerruleConfig>,
    pub sources: FsActor,
    pub workers: Vec<BuildActor>,
    pub builders: BuilderHandles,
    pub ws: WsActor,
    pub ws_tx: mpsc::Sender<WsMsg>,
    pub shutdown_rx: Option<Receiver<()>>,
}

/// Run all actors until the shutdown signal (or until the source watcher
/// ends when no signal is wired).
pub(super) async fn run_actors(actors: Actors) {
    let Actors {
        config,
        sources,
        workers,
        builders,
        ws,
        ws_tx,
        shutdown_rx,
    } = actors;

    let ws_handle = tokio::spawn(ws.run());
    let worker_handles: Vec<JoinHandle<()>> =
        workers.into_iter().map(|w| tokio::spawn(w.run())).collect();
    let mut sources_handle = tokio::spawn(sources.run());

    // `clean` removes the staging tree during the initial compile, so its
    // watcher can only attach afterwards
    let mut staging_handle = None;
    let mut staging_started = false;
    loop {
        if shutdown_requested(shutdown_rx.as_ref()) {
            break;
        }
        if !staging_started && crate::core::is_serving() {
            staging_started = true;
            staging_handle = spawn_staging_watcher(&config, ws_tx.clone());
        }
        if shutdown_rx.is_none() && sources_handle.is_finished() {
            break;
        }
        tokio::time::sleep(POLL).await;
    }

    crate::debug!("actor"; "shutting down");
    sources_handle.abort();
    if let Some(handle) = staging_handle {
        handle.abort();
    }
    for tx in builders.values() {
        let _ = tx.send(BuildMsg::Shutdown).await;
    }
    let _ = ws_tx.send(WsMsg::Shutdown).await;

    let grace = Duration::from_millis(500);
    for handle in worker_handles {
        let _ = tokio::time::timeout(grace, handle).await;
    }
    let _ = tokio::time::timeout(grace, ws_handle).await;
    let _ = (&mut sources_handle).await;
}

fn shutdown_requested(rx: Option<&Receiver<()>>) -> bool {
    match rx {
        Some(rx) if rx.try_recv().is_ok() => {
            crate::debug!("actor"; "shutdown signal received");
            true
        }
        _ => crate::core::is_shutdown(),
    }
}

fn spawn_staging_watcher(
    config: &Arc<FerruleConfig>,
    ws_tx: mpsc::Sender<WsMsg>,
) -> Option<JoinHandle<()>> {
    let root = config.staging_root();
    if let Err(e) = std::fs::create_dir_all(&root) {
        crate::log!("watch"; "cannot create {}: {}", root.display(), e);
        return None;
    }
    match FsActor::new(normalize_path(&root), Route::Staging(ws_tx), Arc::clone(config)) {
        Ok(actor) => Some(tokio::spawn(actor.run())),
        Err(e) => {
            crate::log!("watch"; "cannot watch {}: {}", root.display(), e);
            None
        }
    }
}
