//! Upload targets for published version snapshots.
//!
//! Every target implements [`StorageBackend`]. The publish step only ever
//! writes whole files, so writing is all a target has to support.

pub mod backend;
pub mod error;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
