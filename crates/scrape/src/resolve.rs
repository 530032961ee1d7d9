//! Resolution of the `latest` placeholder to a concrete version.
//!
//! Some indexes list a `*-latest-*` alias next to the versioned copies of the
//! same files. The alias and its versioned twin share a checksum, which is
//! how the concrete version is recovered.

use crate::models::{LATEST, VersionSet};
use regex::Regex;
use std::collections::HashSet;

/// A versioned file seen on the same page as the `latest` aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub file_name: String,
    pub checksum: String,
}

/// Find the version the `latest` entries of `set` point at.
///
/// First collects the checksums of every `latest` file, then walks `listing`
/// in page order and returns the first version token (per `pattern`) of a
/// file whose checksum is in that set. Returns `None` when there are no
/// `latest` checksums or no listed file matches.
pub fn resolve_latest(set: &VersionSet, listing: &[ListingEntry], pattern: &Regex) -> Option<String> {
    let checksums: HashSet<&str> =
        set.get(LATEST)?.iter().filter_map(|file| file.checksum.as_ref()).map(|checksum| checksum.value()).collect();
    if checksums.is_empty() {
        return None;
    }
    listing
        .iter()
        .filter(|entry| checksums.contains(entry.checksum.trim()))
        .find_map(|entry| pattern.find(&entry.file_name))
        .map(|version| version.as_str().to_string())
}

/// Rename `latest` in place when [`resolve_latest`] finds a version.
///
/// Returns the resolved version.
pub fn apply(set: &mut VersionSet, listing: &[ListingEntry], pattern: &Regex) -> Option<String> {
    let version = resolve_latest(set, listing, pattern)?;
    set.rename(LATEST, &version);
    tracing::debug!(version = %version, "Resolved latest alias");
    Some(version)
}
