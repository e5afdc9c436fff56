//! Session lifecycle and map resolution between `skyglass-api` and consumers.
//!
//! This crate owns the logic that binds a selected simulation server to a
//! local, observable copy of its state:
//!
//! - **[`ServerDiscovery`]**: lists available servers with an observable
//!   loading / failed / ready status and an explicit [`retry()`](ServerDiscovery::retry).
//!
//! - **[`SessionController`]**: per-selection fetch loop. Each
//!   [`select()`](SessionController::select) claims the [`SessionStore`]
//!   through a [`SessionLease`], polls the server with no-cache requests and
//!   discards any response that arrives after the selection moved on.
//!
//! - **[`SessionStore`]**: `watch`-backed holder of the current
//!   [`ServerState`](skyglass_api::ServerState). Readers subscribe through
//!   [`ServerStream`].
//!
//! - **[`MapRegistry`] / [`geo::resolve`]**: the known map catalogue and the
//!   geofencing rule (first box in registry order that strictly contains
//!   the reference point).
//!
//! - **[`MapSelector`]**: derives a [`MapSelection`] from the store's
//!   reference entity and follows it across polls.
//!
//! - **[`Router`]** and [`view`]: navigation between discovery and a session,
//!   and the folding of every outcome into a [`ViewState`].

pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod geo;
pub mod registry;
pub mod route;
pub mod selector;
pub mod source;
pub mod store;
pub mod stream;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientConfig, TlsVerification};
pub use controller::{SessionController, SessionPhase, SessionStatus};
pub use discovery::{DiscoveryStatus, ServerDiscovery};
pub use error::CoreError;
pub use geo::ReferenceCoordinate;
pub use registry::{BoundingBox, MapDefinition, MapId, MapRegistry};
pub use route::{Route, Router, UnknownRoute};
pub use selector::{MapSelection, MapSelector};
pub use source::ServerSource;
pub use store::{SessionLease, SessionStore, SessionWriter, StoreSnapshot};
pub use stream::ServerStream;
pub use view::{ViewState, discovery_view, session_view};

// Wire types consumers need alongside the core API.
pub use skyglass_api::{CachePolicy, Entity, EntityId, PropertyValue, ServerDescriptor, ServerState};
