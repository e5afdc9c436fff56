// ── Navigation ──
//
// Two logical routes: `/` shows server discovery, `/servers/{name}` binds
// the session controller to a server. The router keeps the current route
// observable and drives discovery and the controller on navigation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use skyglass_api::ApiClient;

use crate::config::ClientConfig;
use crate::controller::SessionController;
use crate::discovery::ServerDiscovery;
use crate::error::CoreError;
use crate::source::ServerSource;
use crate::store::SessionStore;

const SERVERS_PREFIX: &str = "/servers/";

/// A navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Server { name: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown route: {0}")]
pub struct UnknownRoute(pub String);

impl Route {
    pub fn server(name: impl Into<String>) -> Self {
        Self::Server { name: name.into() }
    }

    /// Parse `/` or `/servers/{name}`. The name is percent-decoded and
    /// must be non-empty.
    pub fn parse(path: &str) -> Option<Self> {
        if path == "/" {
            return Some(Self::Root);
        }
        let raw = path.strip_prefix(SERVERS_PREFIX)?;
        if raw.is_empty() || raw.contains('/') {
            return None;
        }
        let name = urlencoding::decode(raw).ok()?;
        Some(Self::server(name))
    }

    /// Render the route as a path, percent-encoding the server name.
    pub fn path(&self) -> String {
        match self {
            Self::Root => "/".to_owned(),
            Self::Server { name } => format!("{SERVERS_PREFIX}{}", urlencoding::encode(name)),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownRoute(s.to_owned()))
    }
}

// ── Router ───────────────────────────────────────────────────────

/// Binds routes to discovery and the session controller.
pub struct Router<S: ServerSource> {
    discovery: Arc<ServerDiscovery<S>>,
    controller: SessionController<S>,
    route: watch::Sender<Route>,
}

impl<S: ServerSource> Router<S> {
    /// Start at [`Route::Root`] without loading anything.
    pub fn new(discovery: Arc<ServerDiscovery<S>>, controller: SessionController<S>) -> Self {
        let (route, _) = watch::channel(Route::Root);
        Self {
            discovery,
            controller,
            route,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        self.controller.store()
    }

    pub fn current(&self) -> Route {
        self.route.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.route.subscribe()
    }

    pub fn discovery(&self) -> &ServerDiscovery<S> {
        &self.discovery
    }

    pub fn controller(&self) -> &SessionController<S> {
        &self.controller
    }

    /// Activate `route`.
    ///
    /// `Root` ends any session and loads the server list; its outcome is
    /// observable through the discovery status. `Server` selects the server.
    pub async fn navigate(&self, route: Route) {
        debug!(route = %route, "navigating");
        self.route.send_replace(route.clone());
        match route {
            Route::Root => {
                self.controller.detach().await;
                // Failures surface through the discovery status.
                let _ = self.discovery.list().await;
            }
            Route::Server { name } => self.controller.select(&name).await,
        }
    }

    /// Follow the controller's redirect signal, if it has one.
    ///
    /// Returns the route navigated to.
    pub async fn redirect_if_needed(&self) -> Option<Route> {
        let target = self.controller.phase().redirect()?;
        info!(from = %self.current(), to = %target, "redirecting");
        self.navigate(target.clone()).await;
        Some(target)
    }
}

impl Router<ApiClient> {
    /// Wire an HTTP client, a fresh store, discovery and a controller from
    /// `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, CoreError> {
        let client = ApiClient::new(&config.transport()).map_err(|e| CoreError::Config {
            message: e.to_string(),
        })?;
        let source = Arc::new(client);
        let store = Arc::new(SessionStore::new());
        let discovery = Arc::new(ServerDiscovery::new(
            Arc::clone(&source),
            config.discovery_cache_ttl,
        ));
        let controller = SessionController::new(source, store, config.poll_interval);
        Ok(Self::new(discovery, controller))
    }
}
