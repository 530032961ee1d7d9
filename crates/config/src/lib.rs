//! Configuration for pkgsnap.
//!
//! Values are merged from, in increasing priority:
//!
//! 1. built-in defaults,
//! 2. a configuration file (`--config`, or `pkgsnap.toml` in the user's
//!    configuration directory),
//! 3. `PKGSNAP_*` environment variables, nested with `__`
//!    (`PKGSNAP_PROXY__URI`),
//! 4. `ENABLE_PROXY`, which toggles `proxy.enabled`.

pub mod error;
mod upload;

pub use crate::upload::UploadConfig;
use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

pub const APP_NAME: &str = "pkgsnap";
pub const CONFIG_FILE_NAME: &str = "pkgsnap.toml";
pub const DEFAULT_PROXY: &str = "http://127.0.0.1:2023";
pub const PROXY_TOGGLE_ENV: &str = "ENABLE_PROXY";
const ENV_PREFIX: &str = "PKGSNAP_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(deserialize_with = "lenient_bool")]
    pub enabled: bool,
    pub uri: String,
}
impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            uri: DEFAULT_PROXY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where `<product>.version.json` files are written.
    pub work_dir: PathBuf,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub proxy: ProxyConfig,
    pub upload: UploadConfig,
    /// Never write to the upload target, only log.
    pub dry_run: bool,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            timeout_secs: 30,
            user_agent: format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION")),
            proxy: ProxyConfig::default(),
            upload: UploadConfig::None,
            dry_run: false,
        }
    }
}

impl Config {
    /// Load and validate configuration.
    ///
    /// An explicit `file` must exist; the default file is optional.
    #[instrument]
    pub fn load(file: Option<&Path>) -> Result<Self> {
        if let Some(file) = file
            && !file.is_file()
        {
            exn::bail!(ErrorKind::InvalidValue {
                key: "config",
                reason: format!("{} is not a file", file.display()),
            });
        }
        let file = file.map(Path::to_path_buf).or_else(default_config_file);
        let config: Self = Self::figment(file.as_deref()).extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(work_dir = %config.work_dir.display(), upload = config.upload.kind(), "Configuration loaded");
        Ok(config)
    }

    /// The merged configuration sources, before extraction.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file_exact(file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(file)),
                _ => figment.merge(Toml::file_exact(file)),
            };
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Env::raw().only(&[PROXY_TOGGLE_ENV]).map(|_| "proxy.enabled".into()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            exn::bail!(ErrorKind::InvalidValue {
                key: "timeout_secs",
                reason: "must be at least one second".to_string(),
            });
        }
        if self.proxy.enabled && self.proxy.uri.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidValue {
                key: "proxy.uri",
                reason: "proxy is enabled but no URI is set".to_string(),
            });
        }
        self.upload.validate()
    }

    /// The proxy URI, only when the proxy is enabled.
    pub fn effective_proxy(&self) -> Option<&str> {
        self.proxy.enabled.then_some(self.proxy.uri.trim())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `<config dir>/pkgsnap.toml`, when a home directory can be determined.
pub fn default_config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn default_work_dir() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
}

/// Accepts booleans, numbers and the usual spellings (`1`, `yes`, `on`) so
/// that `ENABLE_PROXY=1` works as well as `ENABLE_PROXY=true`.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Str(String),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => flag,
        Flag::Int(number) => number != 0,
        Flag::Str(text) => matches!(text.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
    })
}
