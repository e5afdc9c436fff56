// ── Server discovery ──
//
// Lists the servers the backend knows about and exposes the request as an
// observable loading / failed / ready status. Failures are never retried
// automatically; `retry()` re-issues the request on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use skyglass_api::{CachePolicy, ServerDescriptor};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::source::ServerSource;

/// Observable state of the server list.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryStatus {
    Loading,
    Failed { message: String },
    Ready(Arc<Vec<ServerDescriptor>>),
}

impl DiscoveryStatus {
    pub fn servers(&self) -> Option<&[ServerDescriptor]> {
        match self {
            Self::Ready(list) => Some(list),
            _ => None,
        }
    }
}

/// Fetches the list of available servers.
pub struct ServerDiscovery<S: ServerSource> {
    source: Arc<S>,
    cache_ttl: Duration,
    status: watch::Sender<DiscoveryStatus>,
    /// Only the most recently issued request may update `status`.
    request: AtomicU64,
}

impl<S: ServerSource> ServerDiscovery<S> {
    pub fn new(source: Arc<S>, cache_ttl: Duration) -> Self {
        let (status, _) = watch::channel(DiscoveryStatus::Loading);
        Self {
            source,
            cache_ttl,
            status,
            request: AtomicU64::new(0),
        }
    }

    /// List servers, allowing a recent successful response to be reused.
    pub async fn list(&self) -> Result<Arc<Vec<ServerDescriptor>>, CoreError> {
        self.load(CachePolicy::CacheFirst {
            ttl: self.cache_ttl,
        })
        .await
    }

    /// Re-issue the request, bypassing any cached response.
    pub async fn retry(&self) -> Result<Arc<Vec<ServerDescriptor>>, CoreError> {
        debug!("retrying server discovery");
        self.load(CachePolicy::NoCache).await
    }

    pub fn status(&self) -> DiscoveryStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DiscoveryStatus> {
        self.status.subscribe()
    }

    async fn load(&self, cache: CachePolicy) -> Result<Arc<Vec<ServerDescriptor>>, CoreError> {
        let request = self.request.fetch_add(1, Ordering::AcqRel) + 1;
        self.set_status(request, DiscoveryStatus::Loading);

        match self.source.list_servers(cache).await {
            Ok(servers) => {
                debug!(count = servers.len(), "server list loaded");
                let servers = Arc::new(servers);
                self.set_status(request, DiscoveryStatus::Ready(Arc::clone(&servers)));
                Ok(servers)
            }
            Err(e) => {
                warn!(error = %e, "server discovery failed");
                let err = CoreError::discovery(&e);
                self.set_status(
                    request,
                    DiscoveryStatus::Failed {
                        message: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }

    fn set_status(&self, request: u64, status: DiscoveryStatus) {
        self.status.send_if_modified(|current| {
            if self.request.load(Ordering::Acquire) != request {
                return false;
            }
            *current = status;
            true
        });
    }
}
