//! Server lifecycle management.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tiny_http::Server;

use crate::actor::Coordinator;
use crate::config::FerruleConfig;
use crate::log;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to `interface:base_port`, moving up one port per attempt while busy.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Run the actor system on its own thread with a dedicated tokio runtime.
pub fn spawn_actors(config: Arc<FerruleConfig>, shutdown_rx: Receiver<()>) -> JoinHandle<()> {
    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                log!("actor"; "cannot start runtime: {}", e);
                return;
            }
        };

        rt.block_on(async {
            let coordinator = Coordinator::with_config(config).with_shutdown_signal(shutdown_rx);
            if let Err(e) = coordinator.run().await {
                log!("actor"; "error: {}", e);
            }
        });
    })
}

/// Wait for the actor system to wind down (max 2 seconds).
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_bind_skips_busy_port() {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let taken = std::net::TcpListener::bind(SocketAddr::new(localhost, 0)).unwrap();
        let busy = taken.local_addr().unwrap().port();

        let (_server, addr) = bind_with_retry(localhost, busy).unwrap();
        assert!(addr.port() > busy);
    }
}
