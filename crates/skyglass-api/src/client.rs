// HTTP client for the discovery and session endpoints
//
// Wraps `reqwest::Client` with API-base URL construction, status mapping,
// no-cache request headers and a small in-memory response cache for
// cache-first reads.

use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use reqwest::header::{CACHE_CONTROL, HeaderValue, PRAGMA};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{ServerDescriptor, ServerState};
use crate::transport::{TransportConfig, normalize_base};

/// How a request may be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve a previous successful body if it is younger than `ttl`.
    CacheFirst { ttl: Duration },
    /// Always hit the backend and ask intermediaries not to cache.
    NoCache,
}

struct CachedBody {
    stored_at: Instant,
    body: Bytes,
}

/// Client for the `/api/servers` endpoints.
///
/// Every method resolves its path against the configured API base, so the
/// same client works against a co-located backend and the development host.
pub struct ApiClient {
    http: reqwest::Client,
    api_base: Url,
    cache: DashMap<Url, CachedBody>,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, transport.api_base.clone()))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, api_base: Url) -> Self {
        Self {
            http,
            api_base: normalize_base(api_base),
            cache: DashMap::new(),
        }
    }

    /// The API root all paths are resolved against.
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET {base}servers`
    pub async fn list_servers(&self, cache: CachePolicy) -> Result<Vec<ServerDescriptor>, Error> {
        let url = self.servers_url()?;
        self.get_json(url, cache).await
    }

    /// `GET {base}servers/{name}`
    ///
    /// A 404 is reported as [`Error::NotFound`].
    pub async fn server_state(&self, name: &str, cache: CachePolicy) -> Result<ServerState, Error> {
        let url = self.server_url(name)?;
        self.get_json(url, cache).await
    }

    // ── URL builders ─────────────────────────────────────────────────

    pub(crate) fn servers_url(&self) -> Result<Url, Error> {
        Ok(self.api_base.join("servers")?)
    }

    /// The name is pushed as one percent-encoded segment, so names with
    /// `/`, `?` or spaces cannot escape the path.
    pub(crate) fn server_url(&self, name: &str) -> Result<Url, Error> {
        let mut url = self.servers_url()?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(name);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, url: Url, cache: CachePolicy) -> Result<T, Error> {
        let body = match cache {
            CachePolicy::CacheFirst { ttl } => {
                if let Some(body) = self.cached(&url, ttl) {
                    trace!(%url, "cache hit");
                    body
                } else {
                    let body = self.fetch(&url, false).await?;
                    self.cache.insert(
                        url.clone(),
                        CachedBody {
                            stored_at: Instant::now(),
                            body: body.clone(),
                        },
                    );
                    body
                }
            }
            CachePolicy::NoCache => {
                self.cache.remove(&url);
                self.fetch(&url, true).await?
            }
        };

        serde_json::from_slice(&body).map_err(|e| {
            let text = String::from_utf8_lossy(&body).into_owned();
            let preview: String = text.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: text,
            }
        })
    }

    fn cached(&self, url: &Url, ttl: Duration) -> Option<Bytes> {
        let entry = self.cache.get(url)?;
        (entry.stored_at.elapsed() < ttl).then(|| entry.body.clone())
    }

    async fn fetch(&self, url: &Url, no_cache: bool) -> Result<Bytes, Error> {
        debug!("GET {}", url);

        let mut builder = self.http.get(url.clone());
        if no_cache {
            builder = builder
                .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
                .header(PRAGMA, HeaderValue::from_static("no-cache"));
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                path: url.path().to_owned(),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(Error::Http {
                status: status.as_u16(),
                message: preview,
            });
        }

        resp.bytes().await.map_err(Error::Transport)
    }
}
