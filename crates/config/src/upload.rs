use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use pkgsnap_storage::BackendHandle;
use pkgsnap_storage::backend::{LocalBackend, ReadOnlyBackend};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Where published snapshots are delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UploadConfig {
    /// Keep snapshots in the working directory only.
    #[default]
    None,
    /// Copy snapshots into another directory, e.g. a repository checkout.
    Local { path: PathBuf },
    /// Upload to an S3-compatible bucket.
    S3 {
        bucket: String,
        #[serde(default)]
        prefix: Option<String>,
        region: String,
        #[serde(default)]
        endpoint: Option<String>,
        key_id: String,
        key_secret: String,
    },
}

impl UploadConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            UploadConfig::None => "none",
            UploadConfig::Local { .. } => "local",
            UploadConfig::S3 { .. } => "s3",
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            UploadConfig::None => {},
            UploadConfig::Local { path } => {
                if !path.is_absolute() {
                    exn::bail!(ErrorKind::InvalidValue {
                        key: "upload.path",
                        reason: format!("{} is not an absolute path", path.display()),
                    });
                }
            },
            UploadConfig::S3 { bucket, region, .. } => {
                if bucket.trim().is_empty() {
                    exn::bail!(ErrorKind::InvalidValue {
                        key: "upload.bucket",
                        reason: "must not be empty".to_string(),
                    });
                }
                if region.trim().is_empty() {
                    exn::bail!(ErrorKind::InvalidValue {
                        key: "upload.region",
                        reason: "must not be empty".to_string(),
                    });
                }
            },
        }
        Ok(())
    }

    /// Construct the storage backend for this target.
    ///
    /// With `dry_run`, or when there is no target, the result is a
    /// [`ReadOnlyBackend`] that only logs what would have been uploaded.
    pub fn backend(&self, dry_run: bool) -> Result<BackendHandle> {
        let backend: BackendHandle = match self {
            UploadConfig::None => return Ok(Arc::new(ReadOnlyBackend::detached())),
            UploadConfig::Local { path } => {
                Arc::new(LocalBackend::new("local", path).or_raise(|| ErrorKind::Backend(self.kind().to_string()))?)
            },
            #[cfg(feature = "s3")]
            UploadConfig::S3 {
                bucket,
                prefix,
                region,
                endpoint,
                key_id,
                key_secret,
            } => Arc::new(
                pkgsnap_storage::backend::S3Backend::new(
                    "s3",
                    bucket,
                    prefix.clone(),
                    region,
                    endpoint.clone(),
                    key_id,
                    key_secret,
                )
                .or_raise(|| ErrorKind::Backend(self.kind().to_string()))?,
            ),
            #[cfg(not(feature = "s3"))]
            UploadConfig::S3 { .. } => exn::bail!(ErrorKind::InvalidValue {
                key: "upload.type",
                reason: "built without S3 support; enable the `s3` feature".to_string(),
            }),
        };
        Ok(if dry_run {
            Arc::new(ReadOnlyBackend::new(backend))
        } else {
            backend
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::Path;

    #[rstest]
    #[case(UploadConfig::None, true)]
    #[case(UploadConfig::Local { path: PathBuf::from("/srv/mirror") }, true)]
    #[case(UploadConfig::Local { path: PathBuf::from("relative/mirror") }, false)]
    #[case(UploadConfig::S3 {
        bucket: String::new(),
        prefix: None,
        region: "auto".to_string(),
        endpoint: None,
        key_id: "id".to_string(),
        key_secret: "secret".to_string(),
    }, false)]
    fn test_validate(#[case] upload: UploadConfig, #[case] valid: bool) {
        assert_eq!(upload.validate().is_ok(), valid);
    }

    #[test]
    fn test_none_is_read_only() {
        let backend = UploadConfig::None.backend(false).unwrap();
        assert_eq!(backend.name(), "none");
    }

    #[test]
    fn test_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let upload = UploadConfig::Local {
            path: dir.path().to_path_buf(),
        };
        assert_eq!(upload.backend(false).unwrap().name(), "local");
    }

    #[tokio::test]
    async fn test_dry_run_drops_writes() {
        let dir = tempfile::tempdir().unwrap();
        let upload = UploadConfig::Local {
            path: dir.path().to_path_buf(),
        };
        let backend = upload.backend(true).unwrap();
        backend.write(Path::new("vscode.version.json"), b"{}").await.unwrap();
        assert!(!dir.path().join("vscode.version.json").exists());
    }

    #[cfg(not(feature = "s3"))]
    #[test]
    fn test_s3_requires_feature() {
        let upload = UploadConfig::S3 {
            bucket: "snapshots".to_string(),
            prefix: None,
            region: "auto".to_string(),
            endpoint: None,
            key_id: "id".to_string(),
            key_secret: "secret".to_string(),
        };
        let err = upload.backend(false).err().unwrap();
        assert!(matches!(&*err, ErrorKind::InvalidValue { key: "upload.type", .. }));
    }
}
