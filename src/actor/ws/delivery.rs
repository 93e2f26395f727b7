use crate::reload::message::HotReloadMessage;

use super::WsActor;
use super::client_io::text;

impl WsActor {
    /// Send to every connected client, dropping the ones that fail.
    pub(super) fn broadcast(&self, msg: &HotReloadMessage) {
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        let frame = text(msg);
        clients.retain_mut(|ws| match ws.send(frame.clone()) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("ws"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("ws"; "broadcast to {} clients", clients.len());
    }
}
