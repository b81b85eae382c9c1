//! HTTP protocol layer module
//!
//! Request line parsing, response framing and content-type inference,
//! decoupled from mount resolution and socket handling.

pub mod mime;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use request::{ParsedRequest, RequestError};
pub use response::{build_response, HttpResponse, StatusCode};
