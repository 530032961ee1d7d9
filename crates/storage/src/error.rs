//! Storage Error Types

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// An upload target error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The target refused access, locally or because of bad credentials.
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// The bucket could not be reached or rejected the upload.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Absolute, escaping the root, or containing NUL.
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Network(_))
    }
}
