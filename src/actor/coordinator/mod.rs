//! Actor Coordinator - wires up the watch/serve actor system
//!
//! - one `BuildActor` per asset kind
//! - `FsActor` on the source tree, attached before the initial compile
//! - `FsActor` on the staging tree, attached once serving starts
//! - `WsActor` plus its TCP listener

mod runtime;

use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::builder::{BuildActor, BuilderHandles};
use super::fs::{FsActor, Route};
use super::messages::WsMsg;
use super::ws::WsActor;
use crate::config::FerruleConfig;
use crate::core::AssetKind;
use crate::utils::path::normalize_path;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<FerruleConfig>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn with_config(config: Arc<FerruleConfig>) -> Self {
        Self {
            config,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system until shutdown.
    pub async fn run(self) -> Result<()> {
        let config = self.config;
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        match crate::reload::server::start_ws_server(
            config.serve.interface,
            config.serve.ws_port,
            ws_tx.clone(),
        ) {
            Ok(port) => {
                crate::cli::serve::set_actual_ws_port(port);
                crate::debug!("reload"; "ws://{}:{}", config.serve.interface, port);
            }
            Err(e) => crate::log!("actor"; "websocket server failed: {}", e),
        }

        let mut builders = BuilderHandles::new();
        let mut workers = Vec::with_capacity(AssetKind::ALL.len());
        for kind in AssetKind::ALL {
            let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
            builders.insert(kind, tx);
            workers.push(BuildActor::new(kind, rx, ws_tx.clone(), Arc::clone(&config)));
        }

        let sources = FsActor::new(
            normalize_path(&config.source_root()),
            Route::Sources(builders.clone()),
            Arc::clone(&config),
        )
        .map_err(|e| anyhow::anyhow!("cannot watch {}: {}", config.source_root().display(), e))?;

        crate::debug!("actor"; "start");
        runtime::run_actors(runtime::Actors {
            config,
            sources,
            workers,
            builders,
            ws: WsActor::new(ws_rx),
            ws_tx,
            shutdown_rx: self.shutdown_rx,
        })
        .await;
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
