// Server loop module
// Accepts connections until shutdown, one task per connection

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinSet;

use super::connection::{serve_connection, ConnectionContext};
use super::state::ServerState;
use crate::logger;

/// Pause after a failed accept so a persistent error (e.g. fd exhaustion)
/// does not spin the loop
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Run the accept loop until `shutdown` is notified.
///
/// The loop is the only writer of the running flag: it reports ready once
/// it starts accepting and stopped after every connection task is gone.
/// In-flight connections are aborted on shutdown, not drained.
pub async fn start_server_loop(
    listener: TcpListener,
    ctx: Arc<ConnectionContext>,
    shutdown: Arc<Notify>,
    state: Arc<ServerState>,
) {
    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            logger::log_error(&format!("Listener has no local address: {e}"));
            return;
        }
    };

    let mut connections = JoinSet::new();
    state.mark_running(addr);
    logger::log_server_start(&addr);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        if ctx.options.access_log {
                            logger::log_connection_accepted(&peer_addr);
                        }
                        connections.spawn(serve_connection(stream, peer_addr, Arc::clone(&ctx)));
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }

            // Reap finished handlers so the set does not grow unbounded
            Some(joined) = connections.join_next() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        logger::log_error(&format!("Connection task panicked: {e}"));
                    }
                }
            }

            () = shutdown.notified() => break,
        }
    }

    drop(listener);
    let in_flight = connections.len();
    connections.shutdown().await;
    if in_flight > 0 {
        logger::log_warning(&format!("Aborted {in_flight} in-flight connection(s)"));
    }

    state.mark_stopped(addr);
    logger::log_server_stopped(&addr);
}
