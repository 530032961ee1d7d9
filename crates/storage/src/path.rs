//! Path validation for storage keys.
//!
//! Backends accept paths relative to their root only. Anything that would
//! climb out of the root is rejected before it reaches the filesystem or the
//! network.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a storage path.
///
/// `.` components and repeated separators are dropped, `..` pops the previous
/// component and is rejected when there is nothing left to pop. Null bytes
/// are rejected because they truncate paths in C-based syscalls.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use pkgsnap_storage::validate_path;
/// assert!(validate_path("vscode.version.json").is_ok());
/// assert!(validate_path("snapshots/../miniconda.version.json").is_ok());
/// assert!(validate_path("../vscode.version.json").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("old/.././snapshots//rustup.version.json/").unwrap(),
///     Path::new("snapshots/rustup.version.json")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(s) => {
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
    }
    Ok(components.into_iter().collect())
}
