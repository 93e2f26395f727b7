//! Development server with live reload.
//!
//! ```text
//! bind HTTP ─▶ spawn actors (source watcher attached) ─▶ compile ─▶ serving
//!                                                              │
//!                                        request loop ◀────────┘
//! ```

mod lifecycle;
mod path;
mod response;

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use anyhow::Result;
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::config::FerruleConfig;
use crate::embed::serve::HOTRELOAD_URL;
use crate::task::{self, TaskContext};
use crate::{debug, log};

/// Live-reload port actually bound (may be above the configured one).
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(0);

/// Record the bound live-reload port (called by the coordinator).
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

/// Bound live-reload port, `None` until the listener is up.
fn ws_port() -> Option<u16> {
    match ACTUAL_WS_PORT.load(Ordering::Relaxed) {
        0 => None,
        port => Some(port),
    }
}

/// `ferrule dev`: initial compile, then serve the staging tree and rebuild on
/// change until Ctrl+C.
pub fn serve(config: Arc<FerruleConfig>) -> Result<()> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);

    // attach the source watcher before compiling so no edit is missed
    let actors = lifecycle::spawn_actors(Arc::clone(&config), shutdown_rx);

    initial_compile(&config);
    crate::core::set_serving();
    log!("serve"; "http://{}", addr);

    run_request_loop(&server, &config);
    lifecycle::wait_for_shutdown(actors);
    Ok(())
}

/// Run `compile` once before serving. Nothing it reports stops the server:
/// the watchers pick up the fix. Returns whether it finished cleanly.
fn initial_compile(config: &Arc<FerruleConfig>) -> bool {
    match task::run("compile", &TaskContext::new(Arc::clone(config)).with_progress(true)) {
        Ok(report) if report.is_ok() => true,
        Ok(report) => {
            log!("serve"; "initial compile had {} failure(s), watching for fixes", report.failures);
            false
        }
        Err(e) => {
            log!("error"; "initial compile failed: {}", e);
            log!("serve"; "serving what is staged, watching for fixes");
            false
        }
    }
}

fn run_request_loop(server: &Server, config: &Arc<FerruleConfig>) {
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(4).build() {
        Ok(pool) => pool,
        Err(e) => {
            log!("serve"; "cannot start request workers: {}", e);
            return;
        }
    };

    for request in server.incoming_requests() {
        let config = Arc::clone(config);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &config) {
                debug!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, config: &FerruleConfig) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let ws_port = ws_port();
    if let Some(port) = ws_port
        && request.url() == HOTRELOAD_URL
    {
        return response::respond_hotreload_js(request, port);
    }

    let root = config.staging_root();
    match path::resolve(request.url(), &root) {
        path::Resolved::File(file) => response::respond_file(request, &file, ws_port),
        path::Resolved::Redirect(location) => response::respond_redirect(request, &location),
        path::Resolved::NotFound => response::respond_not_found(request, &root, ws_port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_initial_compile_clean_project() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/html")).unwrap();
        fs::write(dir.path().join("src/html/index.html"), "<p>hi</p>").unwrap();
        let config = Arc::new(test_config_at(dir.path()));

        assert!(initial_compile(&config));
        assert!(dir.path().join("temp/html/index.html").is_file());
    }

    #[test]
    fn test_initial_compile_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/html")).unwrap();
        fs::write(dir.path().join("src/html/index.html"), "<p>hi</p>").unwrap();
        // staging root is a plain file: `clean` cannot remove it as a directory
        fs::write(dir.path().join("temp"), "not a directory").unwrap();
        let config = Arc::new(test_config_at(dir.path()));

        assert!(!initial_compile(&config));
    }
}
