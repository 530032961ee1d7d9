//! Runs every site and gathers the results into a [`ProductCatalog`].

use crate::error::{ErrorKind, Result};
use crate::fetch::{FetchOptions, FetcherHandle};
use crate::models::ProductCatalog;
use crate::site::Site;
use exn::ResultExt;
use tracing::instrument;

/// Sequentially collects a set of sites.
///
/// A site that fails is logged and left out of the catalog; the others still
/// run. The exception is a fail-fast site whose page was fetched but could
/// not be parsed, which stops the run with [`Aborted`](ErrorKind::Aborted).
pub struct Collector {
    sites: Vec<Site>,
    fetcher: FetcherHandle,
    options: FetchOptions,
    catalog: ProductCatalog,
}
impl Collector {
    pub fn new(sites: Vec<Site>, fetcher: FetcherHandle, options: FetchOptions) -> Self {
        Self {
            sites,
            fetcher,
            options,
            catalog: ProductCatalog::new(),
        }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    #[instrument(skip(self), fields(sites = self.sites.len()))]
    pub async fn fetch_all(&mut self) -> Result<()> {
        for site in &self.sites {
            let product = site.product();
            tracing::info!(product, source = site.source(), "Collecting");
            match site.fetch(self.fetcher.as_ref(), &self.options).await {
                Ok(versions) => {
                    tracing::info!(product, versions = versions.len(), files = versions.file_count(), "Collected");
                    self.catalog.insert(product, versions);
                },
                Err(err) if site.fail_fast() && err.is_parse_failure() => {
                    tracing::error!(product, error = ?err, "Unparseable page, aborting run");
                    return Err(err).or_raise(|| ErrorKind::Aborted(product.to_string()));
                },
                Err(err) => {
                    tracing::warn!(product, error = ?err, "Failed to collect, skipping");
                },
            }
        }
        Ok(())
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn into_catalog(self) -> ProductCatalog {
        self.catalog
    }
}
