//! JSON release feeds.
//!
//! Handles feeds shaped like
//! `{"products": [{"url", "sha256hash", "name", "platform": {"os", "prettyname"}}]}`;
//! any other keys, such as `build`, are ignored. Items without a URL are
//! skipped.

use crate::error::{ErrorKind, Result};
use crate::fetch::{FetchOptions, Fetcher, fetch_text};
use crate::filter::NameFilter;
use crate::models::{DistributableFile, LATEST, VersionSet};
use crate::platform::{Arch, Os, classify_arch, classify_os};
use crate::site::ProxyPolicy;
use exn::ResultExt;
use serde::Deserialize;
use tracing::instrument;

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    products: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    #[serde(default)]
    url: String,
    #[serde(default)]
    sha256hash: Option<String>,
    /// Version string.
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    platform: Option<FeedPlatform>,
}

#[derive(Debug, Deserialize)]
struct FeedPlatform {
    #[serde(default)]
    os: String,
    #[serde(default)]
    prettyname: String,
}

/// A release feed in the JSON shape above.
#[derive(Debug, Clone)]
pub struct FeedSite {
    pub product: &'static str,
    pub url: &'static str,
    /// Applied to each item's download URL.
    pub filter: NameFilter,
    /// Checked in order against the download URL before falling back to
    /// [`classify_arch`].
    pub arch_overrides: &'static [(&'static str, Arch)],
    pub proxy: ProxyPolicy,
}
impl FeedSite {
    #[instrument(skip(self, fetcher, options), fields(product = self.product, url = self.url))]
    pub async fn fetch(&self, fetcher: &dyn Fetcher, options: &FetchOptions) -> Result<VersionSet> {
        let body = fetch_text(fetcher, self.url, &self.proxy.apply(options)).await?;
        self.parse(&body)
    }

    /// Build the version set from an already fetched feed body.
    pub fn parse(&self, body: &str) -> Result<VersionSet> {
        let feed: Feed = serde_json::from_str(body).or_raise(|| ErrorKind::MalformedFeed(self.url.to_string()))?;
        let mut set = VersionSet::new();
        for item in feed.products {
            if item.url.trim().is_empty() {
                tracing::debug!(name = ?item.name, "Skipping item without a URL");
                continue;
            }
            if !self.filter.allows(&item.url) {
                tracing::trace!(url = %item.url, "Filtered out");
                continue;
            }
            let file = match DistributableFile::new(&item.url, self.os(&item), self.arch(&item.url)) {
                Ok(file) => file,
                Err(e) => {
                    tracing::debug!(url = %item.url, error = ?e, "Skipping item with unusable URL");
                    continue;
                },
            };
            let version = item.name.as_deref().map(str::trim).filter(|v| !v.is_empty());
            let (label, extra) = match version {
                Some(version) => (version.to_string(), format!("v{version}")),
                None => (LATEST.to_string(), LATEST.to_string()),
            };
            let file = file.with_sha256(item.sha256hash.unwrap_or_default()).with_extra(extra);
            set.push(label, file);
        }
        Ok(set)
    }

    fn arch(&self, url: &str) -> Arch {
        self.arch_overrides
            .iter()
            .find(|(marker, _)| url.contains(marker))
            .map_or_else(|| classify_arch(url), |(_, arch)| *arch)
    }

    fn os(&self, item: &FeedItem) -> Os {
        let Some(platform) = &item.platform else {
            return Os::Unknown;
        };
        match classify_os(&platform.prettyname) {
            Os::Unknown => classify_os(&platform.os),
            os => os,
        }
    }
}
