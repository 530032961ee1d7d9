//! In-memory upload target for tests.

use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Records every [`write()`](StorageBackend::write) so tests can assert
/// exactly what a publish run uploaded.
///
/// ```
/// use pkgsnap_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::default();
/// backend.write(Path::new("vscode.version.json"), b"{}").await?;
/// assert_eq!(backend.write_count().await, 1);
/// assert_eq!(backend.contents(Path::new("vscode.version.json")).await.as_deref(), Some(&b"{}"[..]));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockBackend {
    name: String,
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    writes: RwLock<Vec<PathBuf>>,
    fail_writes: bool,
}
impl Default for MockBackend {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            files: RwLock::default(),
            writes: RwLock::default(),
            fail_writes: false,
        }
    }
}

impl MockBackend {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every write fail with a [`Network`](ErrorKind::Network) error.
    pub fn failing(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Number of write calls received, including failed ones.
    pub async fn write_count(&self) -> usize {
        self.writes.read().await.len()
    }

    /// Paths passed to write, in call order.
    pub async fn written_paths(&self) -> Vec<PathBuf> {
        self.writes.read().await.clone()
    }

    /// Last successfully written contents of `path`.
    pub async fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        let path = validate_path(path).ok()?;
        self.files.read().await.get(&path).cloned()
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.writes.write().await.push(path.clone());
        if self.fail_writes {
            exn::bail!(ErrorKind::Network(format!("refusing to store {}", path.display())));
        }
        self.files.write().await.insert(path, data.to_vec());
        Ok(())
    }
}
