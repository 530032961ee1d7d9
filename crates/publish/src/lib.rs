//! Persists a [`ProductCatalog`] and delivers it to an upload target.
//!
//! Every product with at least one version is written to
//! `<work_dir>/<product>.version.json` and the same bytes are then written to
//! the [`StorageBackend`](pkgsnap_storage::StorageBackend) under the file
//! name. Products are independent: one failing does not stop the rest.

pub mod error;

use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use pkgsnap_scrape::{ProductCatalog, VersionSet};
use pkgsnap_storage::BackendHandle;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// Name of the snapshot file for `product`.
pub fn file_name(product: &str) -> String {
    format!("{product}.version.json")
}

/// What happened to each product during [`Publisher::publish`].
#[derive(Debug, Default)]
pub struct PublishReport {
    /// Local files written, in publish order.
    pub written: Vec<PathBuf>,
    /// Products delivered to the upload target.
    pub uploaded: Vec<String>,
    /// Products with nothing to publish.
    pub skipped: Vec<String>,
    pub failed: Vec<(String, Error)>,
}
impl PublishReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Publisher {
    work_dir: PathBuf,
    upload: BackendHandle,
}
impl Publisher {
    pub fn new(work_dir: impl Into<PathBuf>, upload: BackendHandle) -> Self {
        Self {
            work_dir: work_dir.into(),
            upload,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    #[instrument(skip_all, fields(work_dir = %self.work_dir.display(), target = self.upload.name()))]
    pub async fn publish(&self, catalog: &ProductCatalog) -> PublishReport {
        let mut report = PublishReport::default();
        for (product, versions) in catalog.iter() {
            if versions.is_empty() {
                tracing::info!(product, "Nothing collected, skipping");
                report.skipped.push(product.to_string());
                continue;
            }
            let path = match self.write(product, versions).await {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!(product, error = ?err, "Failed to write snapshot");
                    report.failed.push((product.to_string(), err));
                    continue;
                },
            };
            report.written.push(path.clone());
            match self.upload(&path).await {
                Ok(()) => report.uploaded.push(product.to_string()),
                Err(err) => {
                    tracing::warn!(product, error = ?err, "Failed to upload snapshot");
                    report.failed.push((product.to_string(), err));
                },
            }
        }
        tracing::info!(
            written = report.written.len(),
            uploaded = report.uploaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Publish finished"
        );
        report
    }

    /// Serialize one product into the working directory.
    pub async fn write(&self, product: &str, versions: &VersionSet) -> Result<PathBuf> {
        let name = file_name(product);
        let json = versions.to_pretty_json().or_raise(|| ErrorKind::Serialize(product.to_string()))?;
        fs::create_dir_all(&self.work_dir).await.or_raise(|| ErrorKind::Write(self.work_dir.display().to_string()))?;
        let path = self.work_dir.join(&name);
        fs::write(&path, json.as_bytes()).await.or_raise(|| ErrorKind::Write(path.display().to_string()))?;
        tracing::debug!(path = %path.display(), bytes = json.len(), "Snapshot written");
        Ok(path)
    }

    /// Deliver a written snapshot to the upload target under its file name.
    pub async fn upload(&self, path: &Path) -> Result<()> {
        let display = path.display().to_string();
        let name = path.file_name().map(PathBuf::from).ok_or_else(|| exn::Exn::from(ErrorKind::Upload(display.clone())))?;
        let data = fs::read(path).await.or_raise(|| ErrorKind::Upload(display.clone()))?;
        self.upload.write(&name, &data).await.or_raise(|| ErrorKind::Upload(display))?;
        Ok(())
    }
}
