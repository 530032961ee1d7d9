//! Publish Error Types

use derive_more::{Display, Error};

/// A publish error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for publish operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The version set could not be turned into JSON.
    #[display("failed to serialize {_0}")]
    Serialize(#[error(not(source))] String),
    /// The snapshot file could not be written to the working directory.
    #[display("failed to write {_0}")]
    Write(#[error(not(source))] String),
    /// The upload target rejected the snapshot.
    #[display("failed to upload {_0}")]
    Upload(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upload(_))
    }
}
