//! WebSocket Actor
//!
//! Owns every live-reload connection and turns `WsMsg` into protocol messages:
//!
//! ```text
//! BuildActor / staging FsActor --[WsMsg]--> WsActor --[broadcast]--> browsers
//! ```
//!
//! Unresolved errors are remembered per asset kind, so a page opened while a
//! build is broken still shows the overlay, and a clean rebuild of one kind
//! does not hide the error of another.

mod client_io;
mod delivery;

use std::collections::BTreeMap;
use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use super::messages::WsMsg;
use crate::core::AssetKind;
use crate::reload::message::HotReloadMessage;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Error currently shown in browsers, replayed to new clients.
#[derive(Debug, Clone)]
struct PendingError {
    path: String,
    error: String,
}

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    /// Shared with the reader thread, which drops closed connections
    clients: Clients,
    pending_errors: BTreeMap<AssetKind, PendingError>,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            pending_errors: BTreeMap::new(),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let reader_clients = Arc::clone(&self.clients);
        std::thread::spawn(move || client_io::client_reader_loop(reader_clients));

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Reload { reason } => {
                    crate::debug!("ws"; "reload: {}", reason);
                    self.broadcast(&HotReloadMessage::reload_with_reason(reason));
                }

                WsMsg::Css { files } => {
                    crate::debug!("ws"; "css: {}", files.join(", "));
                    self.broadcast(&HotReloadMessage::css(files));
                }

                WsMsg::Error { kind, path, error } => {
                    self.broadcast(&HotReloadMessage::error(&path, &error));
                    self.pending_errors.insert(kind, PendingError { path, error });
                }

                WsMsg::ClearError { kind } => {
                    if self.pending_errors.remove(&kind).is_none() {
                        continue;
                    }
                    let msg = match self.pending_error() {
                        Some(pending) => HotReloadMessage::error(&pending.path, &pending.error),
                        None => HotReloadMessage::clear_error(),
                    };
                    self.broadcast(&msg);
                }

                WsMsg::AddClient(stream) => self.add_client(stream),

                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    for mut ws in self.clients.lock().drain(..) {
                        let _ = ws.close(None);
                    }
                    break;
                }
            }
        }
    }

    /// The error the overlay should show, first by kind order.
    fn pending_error(&self) -> Option<&PendingError> {
        self.pending_errors.values().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tungstenite::protocol::Message;

    use crate::reload::server::start_ws_server;

    /// Connect a client and read `n` protocol messages.
    fn read_messages(port: u16, n: usize) -> Vec<HotReloadMessage> {
        let (mut client, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
        let mut seen = Vec::new();
        while seen.len() < n {
            if let Message::Text(text) = client.read().unwrap() {
                seen.push(serde_json::from_str(&text).unwrap());
            }
        }
        seen
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pending_error_replayed_until_cleared() {
        let (ws_tx, ws_rx) = mpsc::channel(8);
        let actor = tokio::spawn(WsActor::new(ws_rx).run());
        let port = start_ws_server(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, ws_tx.clone()).unwrap();

        ws_tx
            .send(WsMsg::Error {
                kind: AssetKind::Style,
                path: "src/sass/app.scss".into(),
                error: "expected \";\"".into(),
            })
            .await
            .unwrap();
        let seen = tokio::task::spawn_blocking(move || read_messages(port, 2))
            .await
            .unwrap();
        assert_eq!(
            seen,
            vec![
                HotReloadMessage::connected(),
                HotReloadMessage::error("src/sass/app.scss", "expected \";\""),
            ]
        );

        // after clearing, a new client gets the greeting and then live traffic only
        ws_tx
            .send(WsMsg::ClearError {
                kind: AssetKind::Style,
            })
            .await
            .unwrap();
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
        let client = tokio::task::spawn_blocking(move || {
            let (mut client, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
            let mut next = || match client.read().unwrap() {
                Message::Text(text) => serde_json::from_str::<HotReloadMessage>(&text).unwrap(),
                other => panic!("unexpected frame {other:?}"),
            };
            let greeting = next();
            ready_tx.send(()).unwrap();
            (greeting, next())
        });
        ready_rx.await.unwrap();
        ws_tx
            .send(WsMsg::Reload {
                reason: "html/index.html".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            client.await.unwrap(),
            (
                HotReloadMessage::connected(),
                HotReloadMessage::reload_with_reason("html/index.html")
            )
        );

        ws_tx.send(WsMsg::Shutdown).await.unwrap();
        actor.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_clean_kind_keeps_other_kind_error() {
        let (ws_tx, ws_rx) = mpsc::channel(8);
        let actor = tokio::spawn(WsActor::new(ws_rx).run());
        let port = start_ws_server(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, ws_tx.clone()).unwrap();

        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
        let client = tokio::task::spawn_blocking(move || {
            let (mut client, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
            let mut ready_tx = Some(ready_tx);
            let mut seen = Vec::new();
            while seen.len() < 5 {
                if let Message::Text(text) = client.read().unwrap() {
                    seen.push(serde_json::from_str::<HotReloadMessage>(&text).unwrap());
                    if let Some(tx) = ready_tx.take() {
                        tx.send(()).unwrap();
                    }
                }
            }
            seen
        });
        ready_rx.await.unwrap();

        for (kind, path) in [
            (AssetKind::Style, "src/sass/app.scss"),
            (AssetKind::Script, "src/js/app.js"),
        ] {
            ws_tx
                .send(WsMsg::Error {
                    kind,
                    path: path.into(),
                    error: "bad".into(),
                })
                .await
                .unwrap();
        }
        // the style fix must not hide the script error
        ws_tx
            .send(WsMsg::ClearError {
                kind: AssetKind::Style,
            })
            .await
            .unwrap();
        // a kind that never failed changes nothing
        ws_tx
            .send(WsMsg::ClearError {
                kind: AssetKind::Html,
            })
            .await
            .unwrap();
        ws_tx
            .send(WsMsg::ClearError {
                kind: AssetKind::Script,
            })
            .await
            .unwrap();

        assert_eq!(
            client.await.unwrap(),
            vec![
                HotReloadMessage::connected(),
                HotReloadMessage::error("src/sass/app.scss", "bad"),
                HotReloadMessage::error("src/js/app.js", "bad"),
                HotReloadMessage::error("src/js/app.js", "bad"),
                HotReloadMessage::clear_error(),
            ]
        );

        ws_tx.send(WsMsg::Shutdown).await.unwrap();
        actor.await.unwrap();
    }
}
