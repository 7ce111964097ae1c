//! Store configuration.
//!
//! Settings come from an optional `alumnet.toml` file and are overridden by
//! `ALUMNET_*` environment variables:
//!
//! ```toml
//! [store]
//! url = "redis://:secret@db.internal:6379/0"
//! key_prefix = "alumnet"
//! require_explicit_url = true
//!
//! [store.reconnect]
//! initial_backoff_ms = 250
//! max_backoff_ms = 10000
//! multiplier = 2.0
//! ```

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use log::warn;
use serde::Deserialize;

use crate::{connection::ReconnectPolicy, errors::StoreError};

pub const DEFAULT_STORE_URL: &str = "redis://127.0.0.1:6379/";
pub const DEFAULT_KEY_PREFIX: &str = "alumnet";
pub const DEFAULT_CONFIG_FILE: &str = "alumnet.toml";

pub const ENV_STORE_URL: &str = "ALUMNET_STORE_URL";
pub const ENV_KEY_PREFIX: &str = "ALUMNET_KEY_PREFIX";
pub const ENV_RECONNECT_BACKOFF_MS: &str = "ALUMNET_RECONNECT_BACKOFF_MS";
pub const ENV_ENVIRONMENT: &str = "ALUMNET_ENV";

const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

/// Contents of `alumnet.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSettings {
    pub url: Option<String>,
    pub key_prefix: Option<String>,
    /// Refuse to fall back to the local default URL.
    pub require_explicit_url: bool,
    pub reconnect: ReconnectSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconnectSettings {
    /// `0` disables the backoff.
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: Option<u64>,
    pub multiplier: Option<f64>,
}

impl ConfigFile {
    pub fn from_toml(content: &str) -> Result<Self, StoreError> {
        toml::from_str(content).map_err(|err| StoreError::Config {
            message: format!("invalid configuration: {err}"),
        })
    }

    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|err| StoreError::Config {
            message: format!("failed to read {}: {err}", path.display()),
        })?;
        Self::from_toml(&content)
    }
}

/// Where the store URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    Environment,
    File,
    Fallback,
}

/// Resolved settings used to build a [`crate::store::RedisConnector`].
#[derive(Clone)]
pub struct StoreConfig {
    pub url: String,
    pub key_prefix: String,
    pub reconnect: ReconnectPolicy,
    pub url_source: UrlSource,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &redact_url(&self.url))
            .field("key_prefix", &self.key_prefix)
            .field("reconnect", &self.reconnect)
            .field("url_source", &self.url_source)
            .finish()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_STORE_URL.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            reconnect: ReconnectPolicy::default(),
            url_source: UrlSource::Fallback,
        }
    }
}

impl StoreConfig {
    /// Loads `path` (or `./alumnet.toml` when present) and applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, StoreError> {
        let file = match path {
            Some(path) => ConfigFile::read(path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    ConfigFile::read(&default_path)?
                } else {
                    ConfigFile::default()
                }
            }
        };
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    /// Environment variables only.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::resolve(ConfigFile::default(), |name| std::env::var(name).ok())
    }

    /// Merges `file` with the variables returned by `lookup`; variables win.
    pub fn resolve<F>(file: ConfigFile, lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = file.store;
        let lookup = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let production = lookup(ENV_ENVIRONMENT).is_some_and(|env| env.eq_ignore_ascii_case("production"));
        let (url, url_source) = match (lookup(ENV_STORE_URL), non_blank(settings.url)) {
            (Some(url), _) => (url, UrlSource::Environment),
            (None, Some(url)) => (url, UrlSource::File),
            (None, None) if production || settings.require_explicit_url => {
                return Err(StoreError::Config {
                    message: format!("no store URL configured; set {ENV_STORE_URL} or store.url"),
                });
            }
            (None, None) => {
                warn!("no store URL configured, falling back to {DEFAULT_STORE_URL}");
                (DEFAULT_STORE_URL.to_string(), UrlSource::Fallback)
            }
        };

        let key_prefix = lookup(ENV_KEY_PREFIX)
            .or_else(|| non_blank(settings.key_prefix))
            .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());
        if key_prefix.contains(char::is_whitespace) {
            return Err(StoreError::Config {
                message: format!("key prefix {key_prefix:?} must not contain whitespace"),
            });
        }

        let initial_backoff_ms = match lookup(ENV_RECONNECT_BACKOFF_MS) {
            Some(raw) => raw.parse::<u64>().map_err(|err| StoreError::Config {
                message: format!("{ENV_RECONNECT_BACKOFF_MS}={raw:?} is not a number of milliseconds: {err}"),
            })?,
            None => settings.reconnect.initial_backoff_ms,
        };
        let reconnect = reconnect_policy(initial_backoff_ms, &settings.reconnect)?;

        Ok(Self {
            url,
            key_prefix,
            reconnect,
            url_source,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn reconnect_policy(initial_backoff_ms: u64, settings: &ReconnectSettings) -> Result<ReconnectPolicy, StoreError> {
    if initial_backoff_ms == 0 {
        return Ok(ReconnectPolicy::disabled());
    }
    let multiplier = settings.multiplier.unwrap_or(2.0);
    if !multiplier.is_finite() || multiplier < 1.0 {
        return Err(StoreError::Config {
            message: format!("store.reconnect.multiplier must be at least 1.0, got {multiplier}"),
        });
    }
    let max_backoff_ms = settings.max_backoff_ms.unwrap_or(DEFAULT_MAX_BACKOFF_MS).max(initial_backoff_ms);
    Ok(ReconnectPolicy {
        initial_backoff: Duration::from_millis(initial_backoff_ms),
        max_backoff: Duration::from_millis(max_backoff_ms),
        multiplier,
    })
}

/// Hides the password component of a connection URL.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() && parsed.set_password(Some("***")).is_err() {
                return "[REDACTED]".to_string();
            }
            parsed.to_string()
        }
        Err(_) => "[REDACTED]".to_string(),
    }
}
