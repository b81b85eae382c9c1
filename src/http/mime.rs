//! MIME type detection module
//!
//! Returns the Content-Type for a file path based on its extension, using the
//! `mime_guess` registry. File contents are never sniffed.

use std::path::Path;

/// Fallback for unknown or missing extensions
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Get MIME Content-Type for a file path
///
/// # Examples
/// ```
/// use mountserve::http::mime::content_type_for;
/// use std::path::Path;
/// assert_eq!(content_type_for(Path::new("notes.txt")), "text/plain");
/// assert_eq!(content_type_for(Path::new("Makefile")), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map_or_else(|| OCTET_STREAM.to_string(), |mime| mime.essence_str().to_string())
}
