// ── Fetch capability ──
//
// The seam between session logic and the transport. `ApiClient` is the
// production implementation; tests plug in scripted sources.

use std::future::Future;
use std::sync::Arc;

use skyglass_api::{ApiClient, CachePolicy, Error, ServerDescriptor, ServerState};

/// Anything that can list servers and fetch a server's state.
pub trait ServerSource: Send + Sync + 'static {
    fn list_servers(
        &self,
        cache: CachePolicy,
    ) -> impl Future<Output = Result<Vec<ServerDescriptor>, Error>> + Send;

    fn server_state(
        &self,
        name: &str,
        cache: CachePolicy,
    ) -> impl Future<Output = Result<ServerState, Error>> + Send;
}

impl ServerSource for ApiClient {
    fn list_servers(
        &self,
        cache: CachePolicy,
    ) -> impl Future<Output = Result<Vec<ServerDescriptor>, Error>> + Send {
        ApiClient::list_servers(self, cache)
    }

    fn server_state(
        &self,
        name: &str,
        cache: CachePolicy,
    ) -> impl Future<Output = Result<ServerState, Error>> + Send {
        ApiClient::server_state(self, name, cache)
    }
}

impl<S: ServerSource> ServerSource for Arc<S> {
    fn list_servers(
        &self,
        cache: CachePolicy,
    ) -> impl Future<Output = Result<Vec<ServerDescriptor>, Error>> + Send {
        S::list_servers(self, cache)
    }

    fn server_state(
        &self,
        name: &str,
        cache: CachePolicy,
    ) -> impl Future<Output = Result<ServerState, Error>> + Send {
        S::server_state(self, name, cache)
    }
}
