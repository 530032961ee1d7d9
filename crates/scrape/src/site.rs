//! Registry of the vendor sites that get scraped.
//!
//! Each site is a declarative descriptor consumed by one of the generic
//! engines: [`TableSite`] for HTML download tables, [`FeedSite`] for JSON
//! release feeds and [`FixedSite`] for installers that only ever live at a
//! single well-known URL.

use crate::consts::{BUILD_NUMBER_REGEX, VERSION_REGEX};
use crate::error::Result;
use crate::feed::FeedSite;
use crate::fetch::{FetchOptions, Fetcher};
use crate::filter::{Accept, NameFilter};
use crate::models::{DistributableFile, LATEST, VersionSet};
use crate::platform::{Arch, Os};
use crate::table::{ArchRule, Cell, OsSource, TableLayout, TableSite, VersionRule};

/// Whether a site's requests go through the configured proxy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProxyPolicy {
    #[default]
    Inherit,
    /// Always connect directly; the host rejects proxied requests.
    Direct,
}
impl ProxyPolicy {
    pub fn apply(&self, options: &FetchOptions) -> FetchOptions {
        match self {
            ProxyPolicy::Inherit => options.clone(),
            ProxyPolicy::Direct => options.direct(),
        }
    }
}

/// Installers published at fixed URLs, recorded under `latest`.
#[derive(Debug, Clone)]
pub struct FixedSite {
    pub product: &'static str,
    pub entries: &'static [(&'static str, Os, Arch)],
}
impl FixedSite {
    pub fn build(&self) -> Result<VersionSet> {
        let mut set = VersionSet::new();
        for (url, os, arch) in self.entries {
            set.push(LATEST, DistributableFile::new(url, *os, *arch)?.with_extra(LATEST));
        }
        Ok(set)
    }
}

#[derive(Debug, Clone)]
pub enum Site {
    Table(TableSite),
    Feed(FeedSite),
    Fixed(FixedSite),
}
impl Site {
    pub fn product(&self) -> &'static str {
        match self {
            Site::Table(site) => site.product,
            Site::Feed(site) => site.product,
            Site::Fixed(site) => site.product,
        }
    }

    /// Where the data comes from, for display.
    pub fn source(&self) -> &'static str {
        match self {
            Site::Table(site) => site.page,
            Site::Feed(site) => site.url,
            Site::Fixed(_) => "(built in)",
        }
    }

    pub fn fail_fast(&self) -> bool {
        matches!(self, Site::Table(site) if site.fail_fast)
    }

    /// Collect this site's product. Fixed sites never touch the network.
    pub async fn fetch(&self, fetcher: &dyn Fetcher, options: &FetchOptions) -> Result<VersionSet> {
        match self {
            Site::Table(site) => site.fetch(fetcher, options).await,
            Site::Feed(site) => site.fetch(fetcher, options).await,
            Site::Fixed(site) => site.build(),
        }
    }
}

/// Every built-in site, in the order they are collected.
pub fn registry() -> Vec<Site> {
    vec![
        Site::Table(sdkmanager()),
        Site::Fixed(cygwin()),
        Site::Fixed(msys2()),
        Site::Fixed(rustup()),
        Site::Feed(vscode()),
        Site::Table(miniconda()),
    ]
}

/// Keep only the sites whose product is listed. An empty list keeps
/// everything.
pub fn select(sites: Vec<Site>, products: &[impl AsRef<str>]) -> Vec<Site> {
    if products.is_empty() {
        return sites;
    }
    sites.into_iter().filter(|site| products.iter().any(|p| p.as_ref() == site.product())).collect()
}

/// Android SDK command-line tools.
pub fn sdkmanager() -> TableSite {
    TableSite {
        product: "sdkmanager",
        page: "https://developer.android.com/studio?hl=en",
        base: "https://dl.google.com/android/repository/",
        layout: TableLayout {
            table: "table.download",
            nth: 1,
            skip_rows: 1,
            platform: Some(Cell::text(0)),
            file_name: Cell::text(1).select("button"),
            link: None,
            checksum: Some(Cell::text(3)),
        },
        filter: NameFilter::ALLOW_ALL,
        os: OsSource::Platform,
        arch: ArchRule::Fixed(Arch::All),
        version: VersionRule::FileName(&BUILD_NUMBER_REGEX),
        proxy: ProxyPolicy::Inherit,
        fail_fast: true,
    }
}

pub fn cygwin() -> FixedSite {
    FixedSite {
        product: "cygwin",
        entries: &[("https://cygwin.com/setup-x86_64.exe", Os::Windows, Arch::Amd64)],
    }
}

pub fn msys2() -> FixedSite {
    FixedSite {
        product: "msys2",
        entries: &[(
            "https://github.com/msys2/msys2-installer/releases/download/nightly-x86_64/msys2-x86_64-latest.exe",
            Os::Windows,
            Arch::Amd64,
        )],
    }
}

pub fn rustup() -> FixedSite {
    FixedSite {
        product: "rustup",
        entries: &[
            ("https://static.rust-lang.org/rustup/dist/x86_64-apple-darwin/rustup-init", Os::Darwin, Arch::Amd64),
            ("https://static.rust-lang.org/rustup/dist/aarch64-apple-darwin/rustup-init", Os::Darwin, Arch::Arm64),
            ("https://static.rust-lang.org/rustup/dist/x86_64-unknown-linux-gnu/rustup-init", Os::Linux, Arch::Amd64),
            ("https://static.rust-lang.org/rustup/dist/aarch64-unknown-linux-gnu/rustup-init", Os::Linux, Arch::Arm64),
            ("https://static.rust-lang.org/rustup/dist/x86_64-pc-windows-msvc/rustup-init.exe", Os::Windows, Arch::Amd64),
            ("https://static.rust-lang.org/rustup/dist/aarch64-pc-windows-msvc/rustup-init.exe", Os::Windows, Arch::Arm64),
        ],
    }
}

const VSCODE_ACCEPT: &[Accept] = &[
    Accept::suffix(".exe").forbidding("User"),
    Accept::suffix(".tar.gz"),
    Accept::suffix(".zip").requiring("darwin"),
    Accept::suffix(".deb"),
    Accept::suffix(".rpm"),
];

/// Visual Studio Code, stable channel.
pub fn vscode() -> FeedSite {
    FeedSite {
        product: "vscode",
        url: "https://code.visualstudio.com/sha?build=stable",
        filter: NameFilter {
            deny: &["_cli", "armhf", "armv7hl"],
            accept: VSCODE_ACCEPT,
        },
        arch_overrides: &[
            ("win32-arm64", Arch::Arm64),
            ("win32-x64", Arch::Amd64),
            ("universal", Arch::Any),
            // The plain darwin archive predates the arm64 build.
            ("VSCode-darwin.zip", Arch::Amd64),
        ],
        proxy: ProxyPolicy::Inherit,
    }
}

/// Miniconda installers. The index lists `*-latest-*` aliases next to every
/// versioned installer.
pub fn miniconda() -> TableSite {
    TableSite {
        product: "miniconda",
        page: "https://repo.anaconda.com/miniconda/",
        base: "https://repo.anaconda.com/miniconda/",
        layout: TableLayout {
            table: "table",
            nth: 0,
            skip_rows: 0,
            platform: None,
            file_name: Cell::text(0).select("a"),
            link: Some(Cell::text(0).select("a").attr("href")),
            checksum: Some(Cell::text(3)),
        },
        filter: NameFilter {
            deny: &[".pkg", "Miniconda2-latest-", "Miniconda-latest-"],
            accept: &[],
        },
        os: OsSource::FileName,
        arch: ArchRule::FromFileName,
        version: VersionRule::LatestAlias {
            marker: "latest",
            pattern: &VERSION_REGEX,
        },
        proxy: ProxyPolicy::Direct,
        fail_fast: false,
    }
}
