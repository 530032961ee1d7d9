//! Dry-run upload target.

use async_trait::async_trait;
use std::path::Path;

use crate::{BackendHandle, StorageBackend, error::Result};

/// Turns every write into an info event while still reporting success.
///
/// Wraps the configured backend for `--dry-run`, or nothing at all when no
/// upload target is configured.
#[derive(Clone, Default)]
pub struct ReadOnlyBackend {
    inner: Option<BackendHandle>,
}
impl ReadOnlyBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner: Some(inner) }
    }

    pub fn detached() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.as_ref().map_or("none", |inner| inner.name())
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        tracing::info!(backend = %self.name(), path = %path.display(), bytes = data.len(), "Skipping upload in read-only mode");
        Ok(())
    }
}
