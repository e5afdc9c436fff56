// Shared transport configuration for building reqwest::Client instances.
//
// Carries the API base URL (co-located or development backend), TLS and
// timeout settings so the endpoint client stays free of builder logic.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::Error;

/// API root of the local development backend.
pub const DEVELOPMENT_API_BASE: &str = "http://localhost:7789/api/";

const USER_AGENT: &str = concat!("skyglass/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-signed backends).
    DangerAcceptInvalid,
}

/// Helpers for the two deployment modes of the backend.
pub struct ApiBase;

impl ApiBase {
    /// Backend served from the same origin as the client: `{origin}/api/`.
    pub fn co_located(origin: &Url) -> Result<Url, Error> {
        Ok(origin.join("/api/")?)
    }

    /// Backend running on the local development host.
    pub fn development() -> Url {
        Url::parse(DEVELOPMENT_API_BASE).expect("invalid development API base")
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Root of the API, always ending in `/` (e.g. `http://localhost:7789/api/`).
    pub api_base: Url,
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            api_base: ApiBase::development(),
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    pub fn new(api_base: Url) -> Self {
        Self {
            api_base: normalize_base(api_base),
            ..Self::default()
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Relative joins drop the last path segment unless it ends in `/`.
pub(crate) fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
