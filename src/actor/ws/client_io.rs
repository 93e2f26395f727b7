use std::io;
use std::net::TcpStream;
use std::time::Duration;

use tungstenite::protocol::Message;

use super::{Clients, WsActor};
use crate::reload::message::HotReloadMessage;

impl WsActor {
    /// Handshake a new connection, greet it, and replay the pending error.
    pub(super) fn add_client(&self, stream: TcpStream) {
        // blocking during the handshake, polled non-blocking afterwards
        let mut ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
                return;
            }
        };
        let _ = ws.get_ref().set_nonblocking(true);

        if let Err(e) = ws.send(text(&HotReloadMessage::connected())) {
            crate::debug!("ws"; "failed to greet client: {}", e);
            return;
        }
        if let Some(pending) = self.pending_error() {
            let msg = HotReloadMessage::error(&pending.path, &pending.error);
            if let Err(e) = ws.send(text(&msg)) {
                crate::debug!("ws"; "failed to replay error: {}", e);
                return;
            }
        }

        let mut clients = self.clients.lock();
        clients.push(ws);
        crate::debug!("ws"; "client connected (total: {})", clients.len());
    }
}

pub(super) fn text(msg: &HotReloadMessage) -> Message {
    Message::Text(msg.to_json().into())
}

/// Poll every connection so close frames and dead sockets are noticed
/// between broadcasts. Clients never send anything we act on.
pub(super) fn client_reader_loop(clients: Clients) {
    // the actor side holds the other reference; once it is gone, stop
    while std::sync::Arc::strong_count(&clients) > 1 {
        std::thread::sleep(Duration::from_millis(100));

        clients.lock().retain_mut(|ws| loop {
            match ws.read() {
                Ok(Message::Close(_)) => break false,
                Ok(_) => continue,
                Err(tungstenite::Error::Io(ref e)) if e.kind() == io::ErrorKind::WouldBlock => {
                    break true;
                }
                Err(_) => break false,
            }
        });
    }
}
