use crate::error::{ErrorKind, Result};
use crate::platform::{Arch, Os};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use url::Url;

/// Checksum algorithm attached to every scraped checksum.
pub const SHA256: &str = "sha256";

/// A checksum value together with the algorithm that produced it.
///
/// Both parts are always non-empty; there is no way to construct one without
/// the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    value: String,
    algorithm: String,
}
impl Checksum {
    /// Returns `None` when either part is empty or only whitespace.
    pub fn new(value: impl AsRef<str>, algorithm: impl AsRef<str>) -> Option<Self> {
        let value = value.as_ref().trim();
        let algorithm = algorithm.as_ref().trim();
        if value.is_empty() || algorithm.is_empty() {
            return None;
        }
        Some(Self {
            value: value.to_string(),
            algorithm: algorithm.to_string(),
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }
}

/// One downloadable artifact for a product, version, OS and architecture.
///
/// Serialized with the keys `url`, `arch`, `os`, `sum`, `sum_type` and
/// `extra`; the two checksum keys are omitted when there is no checksum.
///
/// ```
/// use pkgsnap_scrape::models::DistributableFile;
/// use pkgsnap_scrape::platform::{Arch, Os};
///
/// let file = DistributableFile::new("https://cygwin.com/setup-x86_64.exe", Os::Windows, Arch::Amd64)
///     .unwrap()
///     .with_sha256("")
///     .with_extra("latest");
/// assert!(file.checksum.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FileRecord", into = "FileRecord")]
pub struct DistributableFile {
    pub url: Url,
    pub os: Os,
    pub arch: Arch,
    pub checksum: Option<Checksum>,
    /// Free-form label, usually `v{version}` or `latest`.
    pub extra: String,
}
impl DistributableFile {
    /// Build a record from an absolute URL string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidUrl`](ErrorKind::InvalidUrl) for relative or
    /// malformed URLs.
    pub fn new(url: &str, os: Os, arch: Arch) -> Result<Self> {
        let url = Url::parse(url.trim()).or_raise(|| ErrorKind::InvalidUrl(url.to_string()))?;
        Ok(Self::from_url(url, os, arch))
    }

    pub fn from_url(url: Url, os: Os, arch: Arch) -> Self {
        Self {
            url,
            os,
            arch,
            checksum: None,
            extra: String::new(),
        }
    }

    /// Attach a checksum. Empty values leave the record without one.
    pub fn with_checksum(mut self, value: impl AsRef<str>, algorithm: impl AsRef<str>) -> Self {
        if let Some(checksum) = Checksum::new(value, algorithm) {
            self.checksum = Some(checksum);
        }
        self
    }

    pub fn with_sha256(self, value: impl AsRef<str>) -> Self {
        self.with_checksum(value, SHA256)
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }
}

#[derive(Serialize, Deserialize)]
struct FileRecord {
    url: String,
    arch: Arch,
    os: Os,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    sum: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    sum_type: String,
    #[serde(default)]
    extra: String,
}
impl From<DistributableFile> for FileRecord {
    fn from(file: DistributableFile) -> Self {
        let (sum, sum_type) = match file.checksum {
            Some(Checksum { value, algorithm }) => (value, algorithm),
            None => (String::new(), String::new()),
        };
        Self {
            url: file.url.into(),
            arch: file.arch,
            os: file.os,
            sum,
            sum_type,
            extra: file.extra,
        }
    }
}
impl TryFrom<FileRecord> for DistributableFile {
    type Error = ErrorKind;
    fn try_from(record: FileRecord) -> std::result::Result<Self, Self::Error> {
        let url = Url::parse(&record.url).map_err(|_| ErrorKind::InvalidUrl(record.url.clone()))?;
        let checksum = match (record.sum.trim().is_empty(), record.sum_type.trim().is_empty()) {
            (true, true) => None,
            (false, false) => Checksum::new(&record.sum, &record.sum_type),
            _ => {
                return Err(ErrorKind::InvalidRecord(format!(
                    "`sum` and `sum_type` must be set together for {}",
                    record.url
                )));
            },
        };
        Ok(Self {
            url,
            os: record.os,
            arch: record.arch,
            checksum,
            extra: record.extra,
        })
    }
}
