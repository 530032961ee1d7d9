//! HTML table scraping.
//!
//! A [`TableLayout`] says where the download table is and which column holds
//! what; a [`TableSite`] adds how the extracted rows become
//! [`DistributableFile`]s.

use crate::consts;
use crate::error::{ErrorKind, Result};
use crate::fetch::{FetchOptions, Fetcher, fetch_text};
use crate::filter::NameFilter;
use crate::models::{DistributableFile, LATEST, VersionSet};
use crate::platform::{Arch, classify_arch, classify_os};
use crate::resolve::{self, ListingEntry};
use crate::site::ProxyPolicy;
use exn::{OptionExt, ResultExt};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::instrument;
use url::Url;

/// How to turn the selected element into a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    /// Concatenated, trimmed text content.
    Text,
    /// Trimmed value of an attribute.
    Attr(&'static str),
}

/// Position of one field inside a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Index of the `td` within the row.
    pub column: usize,
    /// Optional CSS selector applied inside the `td`; the first match is read.
    pub select: Option<&'static str>,
    pub read: Read,
}
impl Cell {
    /// Text of the whole `td` at `column`.
    pub const fn text(column: usize) -> Self {
        Self {
            column,
            select: None,
            read: Read::Text,
        }
    }

    pub const fn select(mut self, css: &'static str) -> Self {
        self.select = Some(css);
        self
    }

    pub const fn attr(mut self, name: &'static str) -> Self {
        self.read = Read::Attr(name);
        self
    }
}

/// Fields extracted from one table row. Missing cells read as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub platform: String,
    pub file_name: String,
    pub link: String,
    pub checksum: String,
}

/// Where a download table is and how its columns are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    /// CSS selector for candidate tables.
    pub table: &'static str,
    /// Which of the matching tables to use.
    pub nth: usize,
    /// Leading `tr` elements to ignore, such as a header row.
    pub skip_rows: usize,
    pub platform: Option<Cell>,
    pub file_name: Cell,
    /// Link to the file; the file name is used when there is no link column.
    pub link: Option<Cell>,
    pub checksum: Option<Cell>,
}

struct CompiledCell {
    cell: Cell,
    select: Option<Selector>,
}
impl CompiledCell {
    fn new(cell: Cell) -> Result<Self> {
        let select = cell.select.map(parse_selector).transpose()?;
        Ok(Self { cell, select })
    }

    fn read(&self, cells: &[ElementRef<'_>]) -> String {
        let Some(td) = cells.get(self.cell.column) else {
            return String::new();
        };
        let target = match &self.select {
            Some(selector) => match td.select(selector).next() {
                Some(element) => element,
                None => return String::new(),
            },
            None => *td,
        };
        match self.cell.read {
            Read::Text => target.text().collect::<String>().trim().to_string(),
            Read::Attr(name) => target.value().attr(name).unwrap_or_default().trim().to_string(),
        }
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| exn::Exn::from(ErrorKind::Selector(format!("`{css}`: {e}"))))
}

impl TableLayout {
    /// Extract every usable row from `html`.
    ///
    /// Rows without `td` cells, and rows whose file name, link or (when a
    /// platform column is configured) platform is empty, are skipped.
    ///
    /// # Errors
    ///
    /// [`MalformedPage`](ErrorKind::MalformedPage) when the table does not
    /// exist, [`Selector`](ErrorKind::Selector) when the layout itself is
    /// broken.
    pub fn rows(&self, html: &str) -> Result<Vec<Row>> {
        let table_selector = parse_selector(self.table)?;
        let platform = self.platform.map(CompiledCell::new).transpose()?;
        let file_name = CompiledCell::new(self.file_name)?;
        let link = self.link.map(CompiledCell::new).transpose()?;
        let checksum = self.checksum.map(CompiledCell::new).transpose()?;

        let document = Html::parse_document(html);
        let table = document.select(&table_selector).nth(self.nth).ok_or_raise(|| {
            ErrorKind::MalformedPage(format!("no table matching `{}` at index {}", self.table, self.nth))
        })?;

        let mut rows = Vec::new();
        for tr in table.select(&consts::ROW_SELECTOR).skip(self.skip_rows) {
            let cells: Vec<ElementRef<'_>> = tr.select(&consts::CELL_SELECTOR).collect();
            if cells.is_empty() {
                continue;
            }
            let row = Row {
                platform: platform.as_ref().map(|cell| cell.read(&cells)).unwrap_or_default(),
                file_name: file_name.read(&cells),
                link: match &link {
                    Some(cell) => cell.read(&cells),
                    None => file_name.read(&cells),
                },
                checksum: checksum.as_ref().map(|cell| cell.read(&cells)).unwrap_or_default(),
            };
            if row.file_name.is_empty() || row.link.is_empty() || (platform.is_some() && row.platform.is_empty()) {
                continue;
            }
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Source of a row's operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsSource {
    /// The platform column.
    Platform,
    FileName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchRule {
    Fixed(Arch),
    FromFileName,
}

/// How rows are keyed into a [`VersionSet`].
#[derive(Debug, Clone, Copy)]
pub enum VersionRule {
    /// First match of the pattern in the file name, or `latest` when nothing
    /// matches.
    FileName(&'static LazyLock<Regex>),
    /// Rows whose file name contains `marker` are `latest` aliases; every
    /// other row only serves to resolve the alias to a concrete version (see
    /// [`resolve`](crate::resolve)).
    LatestAlias {
        marker: &'static str,
        pattern: &'static LazyLock<Regex>,
    },
}

/// A download page whose files are listed in an HTML table.
#[derive(Debug, Clone)]
pub struct TableSite {
    pub product: &'static str,
    pub page: &'static str,
    /// Base for relative links.
    pub base: &'static str,
    pub layout: TableLayout,
    pub filter: NameFilter,
    pub os: OsSource,
    pub arch: ArchRule,
    pub version: VersionRule,
    pub proxy: ProxyPolicy,
    /// A parse failure aborts the whole run instead of skipping this site.
    pub fail_fast: bool,
}
impl TableSite {
    #[instrument(skip(self, fetcher, options), fields(product = self.product, page = self.page))]
    pub async fn fetch(&self, fetcher: &dyn Fetcher, options: &FetchOptions) -> Result<VersionSet> {
        let html = fetch_text(fetcher, self.page, &self.proxy.apply(options)).await?;
        self.parse(&html)
    }

    /// Build the version set from an already fetched page.
    pub fn parse(&self, html: &str) -> Result<VersionSet> {
        let base = Url::parse(self.base).or_raise(|| ErrorKind::InvalidUrl(self.base.to_string()))?;
        let mut set = VersionSet::new();
        let mut listing = Vec::new();

        for row in self.layout.rows(html)? {
            if !self.filter.allows(&row.file_name) {
                tracing::trace!(file_name = %row.file_name, "Filtered out");
                continue;
            }
            let label = match &self.version {
                VersionRule::FileName(pattern) => pattern.find(&row.file_name).map(|m| m.as_str().to_string()),
                VersionRule::LatestAlias { marker, .. } if row.file_name.contains(marker) => None,
                VersionRule::LatestAlias { .. } => {
                    listing.push(ListingEntry {
                        file_name: row.file_name,
                        checksum: row.checksum,
                    });
                    continue;
                },
            };
            let url = match base.join(&row.link) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(link = %row.link, error = %e, "Skipping row with unusable link");
                    continue;
                },
            };
            let os = match self.os {
                OsSource::Platform => classify_os(&row.platform),
                OsSource::FileName => classify_os(&row.file_name),
            };
            let arch = match self.arch {
                ArchRule::Fixed(arch) => arch,
                ArchRule::FromFileName => classify_arch(&row.file_name),
            };
            let (label, extra) = match label {
                Some(version) => {
                    let extra = format!("v{version}");
                    (version, extra)
                },
                None => (LATEST.to_string(), LATEST.to_string()),
            };
            set.push(label, DistributableFile::from_url(url, os, arch).with_sha256(&row.checksum).with_extra(extra));
        }

        if let VersionRule::LatestAlias { pattern, .. } = &self.version {
            resolve::apply(&mut set, &listing, pattern);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{BUILD_NUMBER_REGEX, VERSION_REGEX};
    use crate::fetch::MockFetcher;
    use crate::models::SHA256;
    use crate::platform::Os;

    const TOOLS_PAGE: &str = r#"
        <html><body>
        <table class="download"><tr><td>Android Studio</td></tr></table>
        <table class="download">
          <tr><th>Platform</th><th>Package</th><th>Size</th><th>SHA-256 checksum</th></tr>
          <tr>
            <td>Windows</td>
            <td><button class="download-dialog">tool-11076708-win.zip</button></td>
            <td>153.6 MB</td>
            <td>abc123</td>
          </tr>
          <tr>
            <td>Mac</td>
            <td><button>tool-11076708-mac.zip</button></td>
            <td>153.6 MB</td>
            <td>def456</td>
          </tr>
          <tr><td></td><td><button>orphan.zip</button></td><td></td><td>000</td></tr>
        </table>
        </body></html>
    "#;

    fn tools_site() -> TableSite {
        TableSite {
            product: "tools",
            page: "https://developer.example/tools",
            base: "https://dl.example/repository/",
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

    const INDEX_PAGE: &str = r#"
        <table>
          <tr><th>Filename</th><th>Size</th><th>Last Modified</th><th>SHA256</th></tr>
          <tr><td><a href="pkg-latest-Windows-x86_64.exe">pkg-latest-Windows-x86_64.exe</a></td><td>1</td><td>x</td><td>deadbeef</td></tr>
          <tr><td><a href="pkg-latest-MacOSX-arm64.pkg">pkg-latest-MacOSX-arm64.pkg</a></td><td>1</td><td>x</td><td>feedface</td></tr>
          <tr><td><a href="pkg-2024.10.01-Windows-x86_64.exe">pkg-2024.10.01-Windows-x86_64.exe</a></td><td>1</td><td>x</td><td>0ld</td></tr>
          <tr><td><a href="pkg-2024.11.05-Windows-x86_64.exe">pkg-2024.11.05-Windows-x86_64.exe</a></td><td>1</td><td>x</td><td>deadbeef</td></tr>
        </table>
    "#;

    fn index_site() -> TableSite {
        TableSite {
            product: "pkg",
            page: "https://repo.example/pkg/",
            base: "https://repo.example/pkg/",
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
                deny: &[".pkg"],
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

    #[test]
    fn test_rows_skip_header_and_incomplete_rows() {
        let rows = tools_site().layout.rows(TOOLS_PAGE).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Row {
            platform: "Windows".to_string(),
            file_name: "tool-11076708-win.zip".to_string(),
            link: "tool-11076708-win.zip".to_string(),
            checksum: "abc123".to_string(),
        });
    }

    #[test]
    fn test_table_scenario() {
        let set = tools_site().parse(TOOLS_PAGE).unwrap();
        assert_eq!(set.versions().collect::<Vec<_>>(), ["11076708"]);
        let files = set.get("11076708").unwrap();
        assert_eq!(files.len(), 2);
        let windows = &files[0];
        assert_eq!(windows.url.as_str(), "https://dl.example/repository/tool-11076708-win.zip");
        assert_eq!(windows.os, Os::Windows);
        assert_eq!(windows.arch, Arch::All);
        assert_eq!(windows.checksum.as_ref().map(|c| (c.value(), c.algorithm())), Some(("abc123", SHA256)));
        assert_eq!(windows.extra, "v11076708");
        assert_eq!(files[1].os, Os::Darwin);
    }

    #[test]
    fn test_missing_table_is_malformed() {
        let err = tools_site().parse("<html><body><p>maintenance</p></body></html>").unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedPage(_)));
    }

    #[test]
    fn test_broken_selector() {
        let mut site = tools_site();
        site.layout.table = "table[";
        let err = site.parse(TOOLS_PAGE).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Selector(_)));
    }

    #[test]
    fn test_unversioned_file_is_latest() {
        let page = r#"<table class="download"></table><table class="download">
            <tr><th>h</th></tr>
            <tr><td>Linux</td><td><button>sdk-tools.zip</button></td><td></td><td></td></tr>
        </table>"#;
        let set = tools_site().parse(page).unwrap();
        let files = set.get(LATEST).unwrap();
        assert_eq!(files[0].extra, LATEST);
        assert!(files[0].checksum.is_none());
    }

    #[test]
    fn test_latest_alias_resolution() {
        let set = index_site().parse(INDEX_PAGE).unwrap();
        assert_eq!(set.versions().collect::<Vec<_>>(), ["2024.11.05"]);
        let files = set.get("2024.11.05").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].url.as_str(), "https://repo.example/pkg/pkg-latest-Windows-x86_64.exe");
        assert_eq!(files[0].os, Os::Windows);
        assert_eq!(files[0].arch, Arch::Amd64);
        assert_eq!(files[0].extra, LATEST);
    }

    #[test]
    fn test_latest_alias_unresolved() {
        let page = r#"<table>
            <tr><td><a href="https://mirror.example/pkg-latest-Linux-aarch64.sh">pkg-latest-Linux-aarch64.sh</a></td><td></td><td></td><td>aa</td></tr>
            <tr><td><a href="pkg-1.0.0-Linux-aarch64.sh">pkg-1.0.0-Linux-aarch64.sh</a></td><td></td><td></td><td>bb</td></tr>
        </table>"#;
        let set = index_site().parse(page).unwrap();
        let files = set.get(LATEST).unwrap();
        assert_eq!(files[0].url.as_str(), "https://mirror.example/pkg-latest-Linux-aarch64.sh");
        assert_eq!((files[0].os, files[0].arch), (Os::Linux, Arch::Arm64));
    }

    #[tokio::test]
    async fn test_fetch_respects_proxy_policy() {
        let fetcher = MockFetcher::new().with_page("https://repo.example/pkg/", INDEX_PAGE);
        let options = FetchOptions {
            proxy: Some("http://127.0.0.1:2023".to_string()),
            ..FetchOptions::default()
        };
        let set = index_site().fetch(&fetcher, &options).await.unwrap();
        assert_eq!(set.file_count(), 1);
        assert_eq!(fetcher.calls().await[0].proxy, None);
    }
}
