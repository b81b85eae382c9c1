//! Logger module
//!
//! Provides logging utilities for the file server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// Target used for access log lines, filterable as `access=info`
pub const ACCESS_TARGET: &str = "access";

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<Option<WorkerGuard>> {
    writer::init(&config.logging.level, config.logging.log_file.as_deref())
}

pub fn log_server_start(addr: &SocketAddr) {
    info!("Server listening on http://{addr}");
}

pub fn log_server_stopped(addr: &SocketAddr) {
    info!("Server on {addr} stopped");
}

pub fn log_already_running() {
    warn!("Server is already running");
}

pub fn log_not_running() {
    info!("Server is not running");
}

pub fn log_bind_failed(addr: &SocketAddr, err: &std::io::Error) {
    error!("Failed to bind {addr}: {err}");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    info!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &impl std::fmt::Display) {
    error!("[Connection] {peer_addr}: {err}");
}

pub fn log_connection_timeout(peer_addr: &SocketAddr, secs: u64) {
    warn!("[Connection] {peer_addr} idle for {secs}s, closing");
}

pub fn log_mounted(virtual_path: &str, location: &Path) {
    info!("[Mount] {virtual_path} -> {}", location.display());
}

pub fn log_unmounted(virtual_path: &str) {
    info!("[Mount] {virtual_path} removed");
}

pub fn log_error(message: &str) {
    error!("{message}");
}

pub fn log_warning(message: &str) {
    warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    info!(target: ACCESS_TARGET, "{}", entry.format(format));
}
