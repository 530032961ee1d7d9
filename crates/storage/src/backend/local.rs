//! Local filesystem storage backend.
//!
//! Uploads into a directory on the local filesystem, typically a checkout of
//! the repository that serves the snapshots.

use crate::error::{ErrorKind, Result};
use crate::{StorageBackend, path::validate as validate_path};
use async_trait::async_trait;
use std::fs::create_dir_all as sync_create_dir;
use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Copies snapshots below `root`.
///
/// ```no_run
/// use pkgsnap_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("mirror", "/srv/snapshots")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}
impl LocalBackend {
    /// Create the backend, creating `root` if needed.
    ///
    /// # Errors
    ///
    /// [`InvalidPath`](ErrorKind::InvalidPath) if `root` is relative or is
    /// something other than a directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || (root.exists() && !root.is_dir()) {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        // Blocking is fine here, it happens once while wiring the run.
        sync_create_dir(&root).map_err(|e| io_error(e, &root))?;
        Ok(Self { name: name.into(), root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn io_error(err: IoError, path: &Path) -> ErrorKind {
    match err.kind() {
        IoErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
        _ => ErrorKind::Io(err),
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let target = self.root.join(validate_path(path)?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_error(e, parent))?;
        }
        tracing::debug!(backend = %self.name, path = %target.display(), bytes = data.len(), "Copying snapshot");
        fs::write(&target, data).await.map_err(|e| io_error(e, &target))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("mirror", temp_dir.path()).is_ok());
        let err = LocalBackend::new("mirror", "relative/path").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_new_creates_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("not/yet/there");
        let backend = LocalBackend::new("mirror", &root).unwrap();
        assert!(root.is_dir());
        assert_eq!(backend.root(), root.as_path());
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        let err = LocalBackend::new("mirror", &file).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_write() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("mirror", temp_dir.path()).unwrap();
        backend.write(Path::new("cygwin.version.json"), b"{}").await.unwrap();
        assert_eq!(std::fs::read(temp_dir.path().join("cygwin.version.json")).unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_write_overwrites_and_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("mirror", temp_dir.path()).unwrap();
        backend.write(Path::new("a/b/rustup.version.json"), b"old").await.unwrap();
        backend.write(Path::new("a/b/rustup.version.json"), b"new").await.unwrap();
        assert_eq!(std::fs::read(temp_dir.path().join("a/b/rustup.version.json")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_write_outside_root_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("root");
        let backend = LocalBackend::new("mirror", &root).unwrap();
        let err = backend.write(Path::new("../escape.json"), b"data").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
        assert!(!temp_dir.path().join("escape.json").exists());
    }
}
