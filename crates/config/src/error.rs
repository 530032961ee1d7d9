//! Configuration Error Types

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configuration sources could not be read or merged.
    #[display("failed to load configuration")]
    Load,
    /// A value was read but is not usable.
    #[display("invalid value for `{key}`: {reason}")]
    InvalidValue {
        key: &'static str,
        reason: String,
    },
    /// The upload target could not be constructed.
    #[display("failed to set up upload target `{_0}`")]
    Backend(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Configuration doesn't fix itself between attempts.
        false
    }
}
