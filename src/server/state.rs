// Observable server state
// Running flag on a watch channel, lifecycle and mount changes on a broadcast channel

use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::{broadcast, watch};

/// Capacity of the event channel; slow subscribers see `Lagged`
const EVENT_CAPACITY: usize = 64;

/// Notifications published to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// The accept loop is ready on `addr`
    Started { addr: SocketAddr },
    /// The accept loop has torn down
    Stopped { addr: SocketAddr },
    Mounted {
        virtual_path: String,
        location: PathBuf,
    },
    Unmounted { virtual_path: String },
}

pub struct ServerState {
    running: watch::Sender<bool>,
    events: broadcast::Sender<ServerEvent>,
}

impl ServerState {
    pub fn new() -> Self {
        let (running, _) = watch::channel(false);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { running, events }
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    pub fn watch_running(&self) -> watch::Receiver<bool> {
        self.running.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Listener reported ready
    pub fn mark_running(&self, addr: SocketAddr) {
        self.transition(true, ServerEvent::Started { addr });
    }

    /// Listener cancelled or gone; idempotent
    pub fn mark_stopped(&self, addr: SocketAddr) {
        self.transition(false, ServerEvent::Stopped { addr });
    }

    pub fn emit(&self, event: ServerEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }

    // The event is sent before watchers are woken, so anyone who observed the
    // flag change can also find the matching event.
    fn transition(&self, running: bool, event: ServerEvent) {
        self.running.send_if_modified(|current| {
            if *current == running {
                return false;
            }
            *current = running;
            self.emit(event);
            true
        });
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
