//! Live reload over WebSocket.
//!
//! ```text
//! builders / staging watcher ──WsMsg──▶ WsActor ──HotReloadMessage──▶ browser
//!                                          ▲
//!                      server (accept) ────┘
//! ```

pub mod message;
pub mod server;
