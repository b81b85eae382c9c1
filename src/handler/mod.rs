//! Request handler module
//!
//! Dispatches one parsed request and produces the response for it.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, Dispatched};
pub use static_files::ServeError;
