// Server module entry
// The `FileServer` facade plus the listener, accept loop and connection handling behind it

pub mod connection;
pub mod listener;
pub mod options;
pub mod signal;
pub mod state;

// `loop` is a keyword, so the module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use connection::ConnectionContext;
pub use listener::create_listener;
pub use options::ServerOptions;
pub use server_loop::start_server_loop;
pub use signal::{ServerSignal, SignalListener};
pub use state::{ServerEvent, ServerState};

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;

use crate::error::ServerError;
use crate::logger;
use crate::mount::MountTable;

/// A spawned accept loop and the means to stop it
struct ListenerHandle {
    addr: SocketAddr,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

/// Embedded static-file server.
///
/// Owns the mount table and the running state. All methods take `&self`, so
/// a `FileServer` can be shared behind an `Arc` between the code that
/// controls it and the code that observes it.
pub struct FileServer {
    options: Arc<ServerOptions>,
    mounts: Arc<MountTable>,
    state: Arc<ServerState>,
    listener: Mutex<Option<ListenerHandle>>,
}

impl FileServer {
    pub fn new(options: ServerOptions) -> Self {
        Self {
            options: Arc::new(options),
            mounts: Arc::new(MountTable::new()),
            state: Arc::new(ServerState::new()),
            listener: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    /// Bind `host:port` and spawn the accept loop.
    ///
    /// The bind happens before this returns, so its failure is reported here.
    /// `is_running` flips to true shortly after, once the loop is polled;
    /// use [`watch_running`](Self::watch_running) to wait for it.
    ///
    /// # Errors
    ///
    /// `AlreadyRunning` if a listener is active (mounts are left alone),
    /// `PortUnavailable`/`Bind` if the socket cannot be bound, `NoRuntime`
    /// when called outside a Tokio runtime.
    pub fn start(&self, port: u16) -> Result<SocketAddr, ServerError> {
        let mut slot = self.lock_listener();
        if slot.as_ref().is_some_and(|handle| !handle.task.is_finished()) {
            logger::log_already_running();
            return Err(ServerError::AlreadyRunning);
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ServerError::NoRuntime)?;

        let requested = SocketAddr::new(self.options.host, port);
        let listener = create_listener(requested).map_err(|e| {
            logger::log_bind_failed(&requested, &e);
            ServerError::from_bind(requested, e)
        })?;
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Bind { addr: requested, source: e })?;

        let ctx = Arc::new(ConnectionContext {
            mounts: Arc::clone(&self.mounts),
            options: Arc::clone(&self.options),
        });
        let shutdown = Arc::new(Notify::new());
        let task = runtime.spawn(start_server_loop(
            listener,
            ctx,
            Arc::clone(&shutdown),
            Arc::clone(&self.state),
        ));

        *slot = Some(ListenerHandle { addr, shutdown, task });
        Ok(addr)
    }

    /// Stop the accept loop and wait for it to tear down.
    ///
    /// In-flight connections are aborted. No-op when not running.
    pub async fn stop(&self) {
        let Some(handle) = self.lock_listener().take() else {
            logger::log_not_running();
            return;
        };

        // notify_one stores a permit, so a loop that has not been polled yet still sees it
        handle.shutdown.notify_one();
        if let Err(e) = handle.task.await {
            logger::log_error(&format!("Listener task failed: {e}"));
        }

        // The loop normally reports this itself; covers a loop that died early
        self.state.mark_stopped(handle.addr);
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Address of the active listener, if any
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock_listener()
            .as_ref()
            .filter(|handle| !handle.task.is_finished())
            .map(|handle| handle.addr)
    }

    /// Snapshot of the mount table, ordered by virtual path
    pub fn mounted_directories(&self) -> BTreeMap<String, PathBuf> {
        self.mounts.snapshot()
    }

    /// Expose `location` under `virtual_path`, replacing any existing mount
    /// at that path. The location is not checked; a missing directory just
    /// produces 404s.
    pub fn mount(&self, location: impl Into<PathBuf>, virtual_path: &str) {
        let location = location.into();
        let (key, _) = self.mounts.insert(virtual_path, location.clone());
        logger::log_mounted(&key, &location);
        self.state.emit(ServerEvent::Mounted {
            virtual_path: key,
            location,
        });
    }

    /// Remove the mount at `virtual_path`; absent paths are ignored
    pub fn unmount(&self, virtual_path: &str) {
        if let Some((key, _)) = self.mounts.remove(virtual_path) {
            logger::log_unmounted(&key);
            self.state.emit(ServerEvent::Unmounted { virtual_path: key });
        }
    }

    /// Replace the whole mount table at once, emitting an event per change.
    ///
    /// Requests never observe a half-applied table.
    pub fn replace_mounts<I, S, P>(&self, entries: I)
    where
        I: IntoIterator<Item = (S, P)>,
        S: AsRef<str>,
        P: Into<PathBuf>,
    {
        let diff = self.mounts.replace(entries);
        for virtual_path in diff.unmounted {
            logger::log_unmounted(&virtual_path);
            self.state.emit(ServerEvent::Unmounted { virtual_path });
        }
        for (virtual_path, location) in diff.mounted {
            logger::log_mounted(&virtual_path, &location);
            self.state.emit(ServerEvent::Mounted {
                virtual_path,
                location,
            });
        }
    }

    pub fn watch_running(&self) -> watch::Receiver<bool> {
        self.state.watch_running()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.state.subscribe()
    }

    fn lock_listener(&self) -> MutexGuard<'_, Option<ListenerHandle>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FileServer {
    fn default() -> Self {
        Self::new(ServerOptions::default())
    }
}

impl Drop for FileServer {
    fn drop(&mut self) {
        let slot = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.shutdown.notify_one();
        }
    }
}
