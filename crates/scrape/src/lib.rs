//! Discovers the latest installer downloads published by vendor sites.
//!
//! Each [`Site`] fetches one product's download page through a
//! [`Fetcher`](fetch::Fetcher), classifies every file it finds by operating
//! system and architecture, and returns a [`VersionSet`]. The [`Collector`]
//! runs all sites in order and keeps the results in a [`ProductCatalog`].

mod collect;
mod consts;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod platform;
pub mod resolve;
pub mod site;
pub mod table;

pub use crate::collect::Collector;
pub use crate::consts::{BUILD_NUMBER_REGEX, VERSION_REGEX};
pub use crate::models::{DistributableFile, LATEST, ProductCatalog, VersionSet};
pub use crate::site::{Site, registry};
