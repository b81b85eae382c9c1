//! Request dispatch
//!
//! Entry point for request processing: parse the request line, check the
//! method, then hand retrieval to the static file loader.

use crate::handler::static_files::{self, ServeError};
use crate::http::request::GET;
use crate::http::{HttpResponse, ParsedRequest, StatusCode};
use crate::mount::MountTable;
use tracing::{debug, error};

/// Result of dispatching one raw request
#[derive(Debug)]
pub struct Dispatched {
    /// `None` when the request line could not be parsed
    pub request: Option<ParsedRequest>,
    pub response: HttpResponse,
}

/// Turn raw request bytes into a response
pub async fn handle_request(raw: &[u8], mounts: &MountTable) -> Dispatched {
    let request = match ParsedRequest::parse(raw) {
        Ok(r) => r,
        Err(e) => {
            debug!(error = %e, "Rejecting request");
            return Dispatched {
                request: None,
                response: finish(HttpResponse::plain_text(
                    StatusCode::BadRequest,
                    "Bad Request",
                )),
            };
        }
    };

    if !request.is_get() {
        let response = HttpResponse::plain_text(StatusCode::MethodNotAllowed, "Method Not Allowed")
            .with_header("Allow", GET);
        return Dispatched {
            request: Some(request),
            response: finish(response),
        };
    }

    let response = match static_files::load_file(mounts, &request.path).await {
        Ok(file) => HttpResponse::new(StatusCode::Ok)
            .with_header("Content-Type", &file.content_type)
            .with_body(file.content),
        Err(err) => error_response(&err),
    };

    Dispatched {
        request: Some(request),
        response: finish(response),
    }
}

fn error_response(err: &ServeError) -> HttpResponse {
    match err.status() {
        StatusCode::NotFound => {
            debug!(error = %err, "File not found");
            HttpResponse::plain_text(StatusCode::NotFound, "File not found")
        }
        status => {
            error!(error = %err, "Failed to serve file");
            HttpResponse::plain_text(status, "Internal Server Error")
        }
    }
}

/// Every connection carries exactly one response
fn finish(response: HttpResponse) -> HttpResponse {
    response.with_header("Connection", "close")
}
