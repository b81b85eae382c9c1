// Signal handling module
//
// Supported signals:
// - SIGHUP:  Reload configuration and mount table
// - SIGTERM: Stop the server
// - SIGINT:  Stop the server (Ctrl+C)

use std::io;

/// What the process was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerSignal {
    Shutdown,
    Reload,
}

/// Registered process signal streams
///
/// | Signal  | Action          |
/// |---------|-----------------|
/// | SIGHUP  | Reload config   |
/// | SIGTERM | Stop            |
/// | SIGINT  | Stop            |
#[cfg(unix)]
pub struct SignalListener {
    sighup: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sigint: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    /// Register the handlers. Must be called inside a runtime.
    pub fn new() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            sighup: signal(SignalKind::hangup())?,
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
        })
    }

    /// Wait for the next signal.
    pub async fn recv(&mut self) -> ServerSignal {
        tokio::select! {
            _ = self.sighup.recv() => ServerSignal::Reload,
            _ = self.sigterm.recv() => ServerSignal::Shutdown,
            _ = self.sigint.recv() => ServerSignal::Shutdown,
        }
    }
}

/// Ctrl+C only; reload is not available
#[cfg(not(unix))]
pub struct SignalListener;

#[cfg(not(unix))]
impl SignalListener {
    pub fn new() -> io::Result<Self> {
        Ok(Self)
    }

    pub async fn recv(&mut self) -> ServerSignal {
        if tokio::signal::ctrl_c().await.is_err() {
            // Without a handler there is nothing left to wait for
            std::future::pending::<()>().await;
        }
        ServerSignal::Shutdown
    }
}
