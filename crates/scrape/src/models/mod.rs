//! Scraped records and the containers they are collected into.

mod file;
mod set;

pub use self::file::{Checksum, DistributableFile, SHA256};
pub use self::set::{LATEST, ProductCatalog, VersionSet};
