//! Shared configuration for skyglass.
//!
//! TOML profiles layered with environment overrides, and translation to
//! `skyglass_core::ClientConfig`. The CLI adds flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Data, Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use skyglass_api::ApiBase;
use skyglass_core::{ClientConfig, TlsVerification};

/// Prefix of environment overrides. Nested keys use `__`,
/// e.g. `SKYGLASS_DEFAULTS__TIMEOUT=10`.
pub const ENV_PREFIX: &str = "SKYGLASS_";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SKYGLASS_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    ///
    /// Returns `Ok(None)` only when no name was asked for and the default
    /// profile does not exist.
    pub fn profile(&self, name: Option<&str>) -> Result<Option<(&str, &Profile)>, ConfigError> {
        let (wanted, explicit) = match name {
            Some(n) => (n, true),
            None => match self.default_profile.as_deref() {
                Some(n) => (n, false),
                None => return Ok(None),
            },
        };
        match self.profiles.get_key_value(wanted) {
            Some((k, p)) => Ok(Some((k.as_str(), p))),
            None if explicit => Err(ConfigError::UnknownProfile {
                name: wanted.to_owned(),
            }),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Session poll interval in seconds. `0` fetches once.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    5
}

/// Where the backend lives relative to the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Served under `{origin}/api/`.
    CoLocated,
    /// Local development backend on port 7789.
    #[default]
    Development,
}

/// A named backend profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default)]
    pub mode: Mode,

    /// Origin of a co-located backend (e.g. "https://ops.example.org").
    pub origin: Option<String>,

    /// Override poll interval (seconds).
    pub poll_interval: Option<u64>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Profile {
    /// Build a `ClientConfig` from this profile, falling back to `defaults`.
    pub fn to_client_config(&self, defaults: &Defaults) -> Result<ClientConfig, ConfigError> {
        let api_base = match self.mode {
            Mode::Development => ApiBase::development(),
            Mode::CoLocated => {
                let origin = self.origin.as_deref().ok_or_else(|| ConfigError::Validation {
                    field: "origin".into(),
                    reason: "required when mode = \"co-located\"".into(),
                })?;
                co_located_base(origin)?
            }
        };

        let tls = if self.insecure.unwrap_or(false) {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        Ok(ClientConfig {
            api_base,
            tls,
            timeout: Duration::from_secs(self.timeout.unwrap_or(defaults.timeout)),
            poll_interval: Duration::from_secs(self.poll_interval.unwrap_or(defaults.poll_interval)),
            ..ClientConfig::default()
        })
    }
}

/// Resolve `{origin}/api/`, rejecting anything that is not an http(s) URL.
pub fn co_located_base(origin: &str) -> Result<url::Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Validation {
        field: "origin".into(),
        reason,
    };
    let url: url::Url = origin
        .parse()
        .map_err(|_| invalid(format!("invalid URL: {origin}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("expected http or https, got '{}'", url.scheme())));
    }
    ApiBase::co_located(&url).map_err(|e| invalid(e.to_string()))
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `SKYGLASS_CONFIG`, then platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("org", "skyglass", "skyglass").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("skyglass");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn layered(file: Data<Toml>) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(file)
}

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = layered(Toml::file(path)).merge(Env::prefixed(ENV_PREFIX).split("__"));
    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
