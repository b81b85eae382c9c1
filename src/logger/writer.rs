//! Log writer module
//!
//! Installs the global `tracing` subscriber, writing to stderr or to a file
//! through a non-blocking appender.

use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global subscriber
///
/// `RUST_LOG` wins over `level` when set. With a `log_file`, the returned
/// guard must be held until shutdown so buffered lines are flushed.
pub fn init(level: &str, log_file: Option<&str>) -> io::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    let Some(path) = log_file else {
        registry
            .with(fmt::layer().with_writer(io::stderr))
            .try_init()
            .map_err(io::Error::other)?;
        return Ok(None);
    };

    let path = Path::new(path);
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log file path has no file name: {}", path.display()),
        )
    })?;
    // Create parent directories if they don't exist
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    registry
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(io::Error::other)?;

    Ok(Some(guard))
}
