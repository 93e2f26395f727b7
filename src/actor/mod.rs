//! Actor system for watch mode.
//!
//! ```text
//! FsActor(src) ──▶ BuildActor × 6 ──┐
//!                                   ├──▶ WsActor ──▶ browsers
//! FsActor(temp) ────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - `messages` - message types between actors
//! - `fs` - file watchers with debouncing and classification
//! - `builder` - per-kind rebuild workers
//! - `ws` - WebSocket broadcast
//! - `coordinator` - wires up and runs the actors

pub mod builder;
pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::Coordinator;
