// ── Runtime client configuration ──
//
// These types describe *where* the backend lives and how often to poll it.
// They never touch disk: the CLI (through skyglass-config) constructs a
// `ClientConfig` and hands it in.

use std::time::Duration;

use skyglass_api::{ApiBase, TlsMode, TransportConfig};
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for talking to one backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:7789/api/` or `https://host/api/`.
    pub api_base: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// How often an active session re-fetches its server state. Zero = once.
    pub poll_interval: Duration,
    /// How long a successful server list may be served from cache.
    pub discovery_cache_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: ApiBase::development(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
            discovery_cache_ttl: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Transport settings for building an `ApiClient`.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
            ..TransportConfig::new(self.api_base.clone())
        }
    }
}
