//! Storage backend trait and implementations.
//!
//! The publish step hands every serialized snapshot to a `StorageBackend`.
//! Which one is used is decided by configuration: a local directory, an
//! S3-compatible bucket, or nothing at all (a [`ReadOnlyBackend`] that only
//! logs what it would have written).

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod ro;
#[cfg(feature = "s3")]
mod s3;

pub use self::local::LocalBackend;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBackend;
pub use self::ro::ReadOnlyBackend;
#[cfg(feature = "s3")]
pub use self::s3::S3Backend;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Destination for published snapshots.
///
/// Paths are relative to the backend root and are checked with
/// [`validate_path`](crate::validate_path) by every implementation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use pkgsnap_storage::{backend::StorageBackend, error::Result};
///
/// async fn upload(backend: &dyn StorageBackend, json: &[u8]) -> Result<()> {
///     backend.write(Path::new("vscode.version.json"), json).await
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// Write file contents, replacing any previous file at `path`.
    ///
    /// Implementations create parent directories as needed.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}
