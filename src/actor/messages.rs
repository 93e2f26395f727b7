//! Actor message definitions.
//!
//! ```text
//! FsActor(src) --BuildMsg--> BuildActor(kind) --Css/Error/ClearError--> WsActor
//! FsActor(temp) ----------------------------------Reload-------------> WsActor
//! ```

use std::net::TcpStream;
use std::path::PathBuf;

use crate::core::AssetKind;

/// Messages to a per-kind build worker.
#[derive(Debug)]
pub enum BuildMsg {
    /// Source files of this kind changed.
    Rebuild { changed: Vec<PathBuf> },
    Shutdown,
}

/// Messages to the WebSocket actor.
#[derive(Debug)]
pub enum WsMsg {
    /// Full page reload
    Reload { reason: String },
    /// Stylesheets rewritten, paths relative to the served root
    Css { files: Vec<String> },
    /// Build error of one kind (display overlay, no reload)
    Error {
        kind: AssetKind,
        path: String,
        error: String,
    },
    /// That kind builds cleanly again
    ClearError { kind: AssetKind },
    /// Freshly accepted connection, handshake pending
    AddClient(TcpStream),
    Shutdown,
}
