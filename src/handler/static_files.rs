//! Static file serving module
//!
//! Resolves a request path through the mount table and loads the file.
//! Nothing is cached: every request performs its own read.

use crate::http::mime;
use crate::http::StatusCode;
use crate::mount::MountTable;
use std::io;
use std::path::PathBuf;
use tokio::fs;

/// A file ready to be sent
#[derive(Debug)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub content: Vec<u8>,
    pub content_type: String,
}

/// Why a retrieval did not produce a file
#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    #[error("no mount resolves {0}")]
    Unresolved(String),

    #[error("not a readable file: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ServeError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unresolved(_) | Self::NotFound(_) => StatusCode::NotFound,
            Self::Io { .. } => StatusCode::InternalServerError,
        }
    }

    fn from_io(path: PathBuf, source: io::Error) -> Self {
        if is_unreadable(&source) {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

/// Missing or unreadable files are a 404, anything else is unexpected.
fn is_unreadable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::NotADirectory
            | io::ErrorKind::InvalidInput
    )
}

/// Load the file a request path points at
pub async fn load_file(mounts: &MountTable, request_path: &str) -> Result<LoadedFile, ServeError> {
    let path = mounts
        .resolve(request_path)
        .ok_or_else(|| ServeError::Unresolved(request_path.to_string()))?;

    let metadata = match fs::metadata(&path).await {
        Ok(m) => m,
        Err(e) => return Err(ServeError::from_io(path, e)),
    };
    // Directory listings are not served
    if !metadata.is_file() {
        return Err(ServeError::NotFound(path));
    }

    let content = match fs::read(&path).await {
        Ok(c) => c,
        Err(e) => return Err(ServeError::from_io(path, e)),
    };
    let content_type = mime::content_type_for(&path);

    Ok(LoadedFile {
        path,
        content,
        content_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hi there").unwrap();

        let mounts = MountTable::new();
        mounts.insert("/files", dir.path());

        let file = load_file(&mounts, "/files/hello.txt").await.unwrap();
        assert_eq!(file.content, b"hi there");
        assert_eq!(file.content_type, "text/plain");
        assert_eq!(file.path, dir.path().join("hello.txt"));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mounts = MountTable::new();
        mounts.insert("/files", dir.path());

        let err = load_file(&mounts, "/files/nope.txt").await.unwrap_err();
        assert!(matches!(err, ServeError::NotFound(_)));
        assert_eq!(err.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn test_unmounted_location_is_not_found() {
        let mounts = MountTable::new();
        mounts.insert("/gone", "/definitely/not/a/real/dir");

        let err = load_file(&mounts, "/gone/file.txt").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn test_unresolved_path() {
        let mounts = MountTable::new();
        let err = load_file(&mounts, "/anything").await.unwrap_err();
        assert!(matches!(err, ServeError::Unresolved(ref p) if p == "/anything"));
        assert_eq!(err.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn test_directory_is_not_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let mounts = MountTable::new();
        mounts.insert("/files", dir.path());

        for path in ["/files", "/files/sub"] {
            let err = load_file(&mounts, path).await.unwrap_err();
            assert!(matches!(err, ServeError::NotFound(_)), "{path}");
        }
    }

    #[test]
    fn test_unexpected_io_is_internal_error() {
        let err = ServeError::from_io(
            PathBuf::from("/x"),
            io::Error::new(io::ErrorKind::Other, "disk on fire"),
        );
        assert_eq!(err.status(), StatusCode::InternalServerError);
        assert!(err.to_string().contains("disk on fire"));
    }
}
