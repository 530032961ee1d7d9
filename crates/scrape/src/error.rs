//! Scraping Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A scraping error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scraping operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or timeout while fetching a source.
    #[display("network error fetching {_0}")]
    Network(#[error(not(source))] String),
    /// The source answered with a non-success HTTP status.
    #[display("unexpected HTTP status {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status code returned.
        status: u16,
    },
    /// The page was fetched but does not have the expected structure.
    #[display("malformed page: {_0}")]
    MalformedPage(#[error(not(source))] String),
    /// The feed was fetched but could not be decoded.
    #[display("malformed feed: {_0}")]
    MalformedFeed(#[error(not(source))] String),
    /// A URL is relative, or not a URL at all.
    #[display("invalid URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// A site descriptor contains a CSS selector that does not parse.
    #[display("invalid selector: {_0}")]
    Selector(#[error(not(source))] String),
    /// A serialized snapshot record is inconsistent.
    #[display("invalid record: {_0}")]
    InvalidRecord(#[error(not(source))] String),
    /// A fail-fast site could not be parsed; the whole run stops.
    #[display("aborted: {_0} could not be parsed")]
    Aborted(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status { .. })
    }

    /// Returns `true` if the source was reachable but its content was not
    /// understood.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::MalformedPage(_) | Self::MalformedFeed(_) | Self::Selector(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Network("https://example.com".into()), true, false)]
    #[case(ErrorKind::Status { url: "https://example.com".into(), status: 503 }, true, false)]
    #[case(ErrorKind::MalformedPage("no table".into()), false, true)]
    #[case(ErrorKind::MalformedFeed("eof".into()), false, true)]
    #[case(ErrorKind::Selector("table[".into()), false, true)]
    #[case(ErrorKind::InvalidUrl("/relative".into()), false, false)]
    #[case(ErrorKind::Aborted("sdkmanager".into()), false, false)]
    fn test_classification(#[case] kind: ErrorKind, #[case] retryable: bool, #[case] parse_failure: bool) {
        assert_eq!(kind.is_retryable(), retryable);
        assert_eq!(kind.is_parse_failure(), parse_failure);
    }
}
