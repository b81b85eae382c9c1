//! Embedded static-file HTTP server.
//!
//! A [`FileServer`] exposes local directories over plain HTTP under virtual
//! path prefixes. Each connection carries exactly one `GET` request; the
//! response is written and the connection is closed.
//!
//! ```no_run
//! # async fn run() -> Result<(), mountserve::ServerError> {
//! let server = mountserve::FileServer::default();
//! server.mount("/srv/www", "/");
//! server.mount("/srv/docs", "/docs");
//! let addr = server.start(8080)?;
//! println!("serving on {addr}");
//! server.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod mount;
pub mod server;

pub use error::ServerError;
pub use mount::MountTable;
pub use server::{FileServer, ServerEvent, ServerOptions};

/// Port used when none is configured
pub const DEFAULT_PORT: u16 = 80;
