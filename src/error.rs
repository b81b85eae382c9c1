//! Errors surfaced to callers of the server facade.
//!
//! Per-request failures never show up here; they are turned into HTTP
//! responses inside the connection handler.

use std::io;
use std::net::SocketAddr;

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("server is already running")]
    AlreadyRunning,

    #[error("port unavailable on {addr}: {source}")]
    PortUnavailable {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("start must be called from within a Tokio runtime")]
    NoRuntime,
}

impl ServerError {
    /// Classify a bind failure for `addr`.
    pub(crate) fn from_bind(addr: SocketAddr, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::AddrInUse | io::ErrorKind::PermissionDenied => {
                Self::PortUnavailable { addr, source }
            }
            _ => Self::Bind { addr, source },
        }
    }
}
