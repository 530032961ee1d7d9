//! S3-compatible storage backend.
//!
//! Publishes snapshots into a bucket on AWS S3 or any S3-compatible service
//! (Backblaze B2, MinIO, Tigris). Every target carries its own `key_id` and
//! `key_secret` from configuration.

use crate::{
    StorageBackend,
    error::{ErrorKind, Result},
    validate_path,
};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    error::DisplayErrorContext,
    primitives::ByteStream,
};
use exn::OptionExt;
use std::path::Path;

/// Uploads snapshots as `application/json` objects under an optional key
/// prefix.
///
/// ```no_run
/// use pkgsnap_storage::backend::S3Backend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = S3Backend::new(
///     "snapshots",
///     "downloads-bucket",
///     Some("versions".to_string()),
///     "us-west-004",
///     Some("https://s3.us-west-004.backblazeb2.com"),
///     "access_key_id",
///     "secret_access_key",
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Backend {
    name: String,
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl S3Backend {
    /// `region` is whatever the provider expects (`us-west-004` for
    /// Backblaze, `auto` for R2). `endpoint` is only needed for services
    /// other than AWS.
    pub fn new(
        name: impl Into<String>,
        bucket: impl Into<String>,
        prefix: Option<String>,
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Result<Self> {
        let prefix = prefix.map(|p| key_string(&p)).transpose()?;
        let credentials = Credentials::new(key_id, key_secret, None, None, "pkgsnap-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            // 1 initial attempt + 3 retries with exponential backoff.
            .retry_config(RetryConfig::standard().with_max_attempts(4))
            .force_path_style(true);
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        Ok(Self {
            name: name.into(),
            client: Client::from_conf(config_builder.build()),
            bucket: bucket.into(),
            prefix,
        })
    }

    fn object_key(&self, path: &Path) -> Result<String> {
        Ok(join_key(self.prefix.as_deref(), &key_string(path)?))
    }
}

/// A validated path as a `/`-separated UTF-8 key.
fn key_string(path: impl AsRef<Path>) -> Result<String> {
    let validated = validate_path(path)?;
    let key = validated.to_str().map(str::to_string).ok_or_raise(|| ErrorKind::InvalidPath(validated.clone()))?;
    Ok(key)
}

fn join_key(prefix: Option<&str>, path: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), path),
        None => path.to_string(),
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let key = self.object_key(path)?;
        tracing::debug!(backend = %self.name, bucket = %self.bucket, key = %key, bytes = data.len(), "Uploading object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/json")
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|err| ErrorKind::Network(DisplayErrorContext(err).to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(prefix: Option<&str>) -> Result<S3Backend> {
        S3Backend::new("s3", "bucket", prefix.map(str::to_string), "auto", None::<String>, "id", "secret")
    }

    #[test]
    fn test_join_key() {
        assert_eq!(join_key(None, "vscode.version.json"), "vscode.version.json");
        assert_eq!(join_key(Some("versions"), "vscode.version.json"), "versions/vscode.version.json");
    }

    #[test]
    fn test_prefix_is_normalized() {
        let backend = backend(Some("./versions//stable/")).unwrap();
        assert_eq!(backend.object_key(Path::new("cygwin.version.json")).unwrap(), "versions/stable/cygwin.version.json");
    }

    #[test]
    fn test_new_rejects_traversal_prefix() {
        let err = backend(Some("../up")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_object_key_rejects_traversal() {
        let backend = backend(None).unwrap();
        assert_eq!(backend.object_key(Path::new("rustup.version.json")).unwrap(), "rustup.version.json");
        assert!(backend.object_key(Path::new("../rustup.version.json")).is_err());
    }
}
