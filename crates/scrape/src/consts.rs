use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

selector!(ROW_SELECTOR, "tr");
selector!(CELL_SELECTOR, "td");

// A dotted version such as `24.9.2` or `2024.11.05`.
regex!(VERSION_REGEX, r"\d+(?:\.\d+)+");
// The first run of digits, e.g. the build number in `commandlinetools-linux-11076708_latest.zip`.
regex!(BUILD_NUMBER_REGEX, r"\d+");
