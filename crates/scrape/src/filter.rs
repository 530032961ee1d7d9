//! File-name filtering rules.

/// Accept names ending in `suffix`, optionally only when they also contain
/// (or do not contain) a marker substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accept {
    pub suffix: &'static str,
    pub requires: Option<&'static str>,
    pub forbids: Option<&'static str>,
}
impl Accept {
    pub const fn suffix(suffix: &'static str) -> Self {
        Self {
            suffix,
            requires: None,
            forbids: None,
        }
    }

    pub const fn requiring(mut self, marker: &'static str) -> Self {
        self.requires = Some(marker);
        self
    }

    pub const fn forbidding(mut self, marker: &'static str) -> Self {
        self.forbids = Some(marker);
        self
    }

    fn matches(&self, name: &str) -> bool {
        name.ends_with(self.suffix)
            && self.requires.is_none_or(|marker| name.contains(marker))
            && self.forbids.is_none_or(|marker| !name.contains(marker))
    }
}

/// Deny-then-accept filter over file names or URLs.
///
/// A name containing any `deny` substring is rejected. Otherwise it is
/// accepted when `accept` is empty or any of its rules match. Matching is
/// case-sensitive.
///
/// ```
/// use pkgsnap_scrape::filter::{Accept, NameFilter};
///
/// const INSTALLERS: NameFilter = NameFilter {
///     deny: &["_cli"],
///     accept: &[Accept::suffix(".exe").forbidding("User")],
/// };
/// assert!(INSTALLERS.allows("VSCodeSetup-x64.exe"));
/// assert!(!INSTALLERS.allows("VSCodeUserSetup-x64.exe"));
/// assert!(!INSTALLERS.allows("vscode_cli_win32_x64.exe"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NameFilter {
    pub deny: &'static [&'static str],
    pub accept: &'static [Accept],
}
impl NameFilter {
    /// Accepts every name.
    pub const ALLOW_ALL: Self = Self { deny: &[], accept: &[] };

    pub fn allows(&self, name: &str) -> bool {
        if self.deny.iter().any(|denied| name.contains(denied)) {
            return false;
        }
        self.accept.is_empty() || self.accept.iter().any(|rule| rule.matches(name))
    }
}
