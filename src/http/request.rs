//! Request line parsing
//!
//! Only the first line of a request is interpreted:
//!
//! ```text
//! GET /docs/readme.txt HTTP/1.1\r\n
//! ```
//!
//! Headers and bodies that follow are ignored.

/// The single supported retrieval verb
pub const GET: &str = "GET";

/// Method and target taken from a request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub method: String,
    pub path: String,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Fewer than two whitespace-delimited tokens on the request line
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),
}

impl ParsedRequest {
    /// Parse the request line out of raw request bytes.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; a mangled path simply
    /// fails to resolve later.
    pub fn parse(raw: &[u8]) -> Result<Self, RequestError> {
        let text = String::from_utf8_lossy(raw);
        let line = text.lines().next().unwrap_or_default();

        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(method), Some(path)) => Ok(Self {
                method: method.to_string(),
                path: path.to_string(),
            }),
            _ => Err(RequestError::MalformedRequestLine(line.to_string())),
        }
    }

    pub fn is_get(&self) -> bool {
        self.method == GET
    }
}
