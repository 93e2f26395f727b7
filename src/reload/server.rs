//! WebSocket listener for live reload.
//!
//! Accepted TCP streams are handed to `WsActor`, which does the handshake and
//! owns the connection from then on.

use std::io;
use std::net::{IpAddr, SocketAddr, TcpListener};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::actor::messages::WsMsg;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Bind the live-reload listener and start the acceptor thread.
///
/// Returns the port actually bound, which may be above `base_port` when that
/// one is taken.
pub fn start_ws_server(
    interface: IpAddr,
    base_port: u16,
    ws_tx: mpsc::Sender<WsMsg>,
) -> Result<u16> {
    let (listener, port) = try_bind_port(interface, base_port)?;
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "client connected: {}", addr);

                    // handshake runs blocking inside the actor
                    let _ = stream.set_nonblocking(false);
                    if ws_tx.blocking_send(WsMsg::AddClient(stream)).is_err() {
                        break;
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if ws_tx.is_closed() {
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
        crate::debug!("reload"; "listener stopped");
    });

    Ok(port)
}

/// Try binding to `base_port`, moving up one port per attempt.
fn try_bind_port(interface: IpAddr, base_port: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual = listener.local_addr()?.port();
                if offset > 0 {
                    crate::log!("reload"; "port {} in use, using {} instead", base_port, actual);
                }
                return Ok((listener, actual));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind live-reload server after {} attempts: {}",
        MAX_PORT_RETRIES,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
