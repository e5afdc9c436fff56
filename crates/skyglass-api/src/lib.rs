// skyglass-api: async client for simulation server discovery and live state

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{ApiClient, CachePolicy};
pub use error::Error;
pub use models::{Entity, EntityId, PropertyValue, ServerDescriptor, ServerState};
pub use transport::{ApiBase, DEVELOPMENT_API_BASE, TlsMode, TransportConfig};
