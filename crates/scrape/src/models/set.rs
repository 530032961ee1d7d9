use super::DistributableFile;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder version label for sites that only publish a "latest" pointer.
pub const LATEST: &str = "latest";

/// Files of one product, grouped by version label.
///
/// Files keep their discovery order within a version; versions are sorted so
/// that serialized snapshots are stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionSet(BTreeMap<String, Vec<DistributableFile>>);
impl VersionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, version: impl Into<String>, file: DistributableFile) {
        self.0.entry(version.into()).or_default().push(file);
    }

    pub fn get(&self, version: &str) -> Option<&[DistributableFile]> {
        self.0.get(version).map(Vec::as_slice)
    }

    pub fn contains(&self, version: &str) -> bool {
        self.0.contains_key(version)
    }

    /// Move every file stored under `from` to `to`, after any files already
    /// there, and drop `from`.
    ///
    /// Returns `false` (and changes nothing) when `from` is absent or equal
    /// to `to`.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return false;
        }
        let Some(files) = self.0.remove(from) else {
            return false;
        };
        self.0.entry(to.to_string()).or_default().extend(files);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of version labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Number of files across every version.
    pub fn file_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DistributableFile])> {
        self.0.iter().map(|(version, files)| (version.as_str(), files.as_slice()))
    }

    pub fn files(&self) -> impl Iterator<Item = &DistributableFile> {
        self.0.values().flatten()
    }

    /// Serialize as JSON indented with two spaces.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).or_raise(|| ErrorKind::InvalidRecord("version set".to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).or_raise(|| ErrorKind::InvalidRecord("version set".to_string()))
    }
}

/// Every product collected during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductCatalog(BTreeMap<String, VersionSet>);
impl ProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a product's versions, returning whatever was stored before.
    pub fn insert(&mut self, product: impl Into<String>, versions: VersionSet) -> Option<VersionSet> {
        self.0.insert(product.into(), versions)
    }

    pub fn get(&self, product: &str) -> Option<&VersionSet> {
        self.0.get(product)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VersionSet)> {
        self.0.iter().map(|(product, versions)| (product.as_str(), versions))
    }

    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os};

    fn file(url: &str, sum: &str, extra: &str) -> DistributableFile {
        DistributableFile::new(url, Os::Linux, Arch::Amd64).unwrap().with_sha256(sum).with_extra(extra)
    }

    #[test]
    fn test_push_keeps_discovery_order() {
        let mut set = VersionSet::new();
        set.push("1.0", file("https://a.example/b", "", "v1.0"));
        set.push("1.0", file("https://a.example/a", "", "v1.0"));
        let urls: Vec<_> = set.get("1.0").unwrap().iter().map(|f| f.url.as_str()).collect();
        assert_eq!(urls, ["https://a.example/b", "https://a.example/a"]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.file_count(), 2);
    }

    #[test]
    fn test_rename() {
        let mut set = VersionSet::new();
        set.push(LATEST, file("https://a.example/new", "aa", LATEST));
        set.push("24.9.2", file("https://a.example/old", "bb", "v24.9.2"));
        assert!(set.rename(LATEST, "24.9.2"));
        assert!(!set.contains(LATEST));
        let urls: Vec<_> = set.get("24.9.2").unwrap().iter().map(|f| f.url.as_str()).collect();
        assert_eq!(urls, ["https://a.example/old", "https://a.example/new"]);
    }

    #[test]
    fn test_rename_missing_or_same_key() {
        let mut set = VersionSet::new();
        set.push(LATEST, file("https://a.example/x", "", LATEST));
        assert!(!set.rename("1.0", "2.0"));
        assert!(!set.rename(LATEST, LATEST));
        assert_eq!(set.get(LATEST).map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_json_round_trip() {
        let mut set = VersionSet::new();
        set.push("1.95.3", file("https://update.code.visualstudio.com/a.deb", "abc", "v1.95.3"));
        set.push("1.95.3", file("https://update.code.visualstudio.com/b.rpm", "", "v1.95.3"));
        set.push(LATEST, file("https://cygwin.com/setup-x86_64.exe", "", LATEST));
        let json = set.to_pretty_json().unwrap();
        assert!(json.starts_with("{\n  \"1.95.3\": [\n    {"));
        assert_eq!(VersionSet::from_json(&json).unwrap(), set);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = VersionSet::from_json("[1, 2]").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidRecord(_)));
    }

    #[test]
    fn test_catalog() {
        let mut catalog = ProductCatalog::new();
        assert!(catalog.is_empty());
        catalog.insert("vscode", VersionSet::new());
        let mut rustup = VersionSet::new();
        rustup.push(LATEST, file("https://static.rust-lang.org/rustup-init", "", LATEST));
        assert!(catalog.insert("rustup", rustup.clone()).is_none());
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("rustup"), Some(&rustup));
        assert_eq!(catalog.products().collect::<Vec<_>>(), ["rustup", "vscode"]);
    }
}
