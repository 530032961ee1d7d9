//! Operating system and CPU architecture tags.
//!
//! Vendor pages describe platforms in free text ("macOS Universal",
//! "Miniconda3-latest-Linux-aarch64.sh", "x86_64-pc-windows-msvc"). The
//! classifiers below reduce any such label to a fixed tag by looking for the
//! first known token it contains.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Normalized operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Windows,
    Linux,
    Darwin,
    /// Runs anywhere.
    Any,
    Unknown,
}
impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "windows",
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Any => "any",
            Os::Unknown => "unknown",
        }
    }
}
impl Display for Os {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Amd64,
    Arm64,
    /// 32-bit x86.
    #[serde(rename = "386")]
    X86,
    /// A single artifact covering every architecture, such as a zip of
    /// command-line tools.
    All,
    /// A universal binary.
    Any,
    Unknown,
}
impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::X86 => "386",
            Arch::All => "all",
            Arch::Any => "any",
            Arch::Unknown => "unknown",
        }
    }
}
impl Display for Arch {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

// `darwin` contains `win`, so every darwin token must come first.
const OS_TOKENS: &[(&str, Os)] = &[
    ("darwin", Os::Darwin),
    ("macos", Os::Darwin),
    ("osx", Os::Darwin),
    ("mac", Os::Darwin),
    ("windows", Os::Windows),
    ("win", Os::Windows),
    ("linux", Os::Linux),
];

// `x86_64` contains `x86`, so the 64-bit tokens must come first.
const ARCH_TOKENS: &[(&str, Arch)] = &[
    ("x86_64", Arch::Amd64),
    ("x86-64", Arch::Amd64),
    ("amd64", Arch::Amd64),
    ("x64", Arch::Amd64),
    ("aarch64", Arch::Arm64),
    ("arm64", Arch::Arm64),
    ("i686", Arch::X86),
    ("i386", Arch::X86),
    ("x86", Arch::X86),
    ("386", Arch::X86),
];

fn first_token<T: Copy>(tokens: &[(&str, T)], text: &str) -> Option<T> {
    let lowered = text.to_lowercase();
    tokens.iter().find(|(token, _)| lowered.contains(token)).map(|(_, tag)| *tag)
}

/// Classify a platform label, file name or URL into an [`Os`].
///
/// ```
/// use pkgsnap_scrape::platform::{Os, classify_os};
///
/// assert_eq!(classify_os("Miniconda3-latest-MacOSX-arm64.sh"), Os::Darwin);
/// assert_eq!(classify_os("Solaris"), Os::Unknown);
/// ```
pub fn classify_os(text: &str) -> Os {
    first_token(OS_TOKENS, text).unwrap_or(Os::Unknown)
}

/// Classify a platform label, file name or URL into an [`Arch`].
pub fn classify_arch(text: &str) -> Arch {
    first_token(ARCH_TOKENS, text).unwrap_or(Arch::Unknown)
}
