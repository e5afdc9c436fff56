// ── Core error types ──
//
// User-facing errors from skyglass-core. Consumers never see HTTP status
// codes or JSON parse failures directly: transport errors are translated
// according to the endpoint that produced them.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Discovery ────────────────────────────────────────────────────
    #[error("Could not list servers: {reason}")]
    DiscoveryFailed { reason: String, transient: bool },

    // ── Session ──────────────────────────────────────────────────────
    #[error("Server not found: {server}")]
    SessionNotFound { server: String },

    #[error("Could not fetch state of server {server}: {reason}")]
    SessionFetch { server: String, reason: String },

    // ── Map resolution ───────────────────────────────────────────────
    #[error("Failed to detect map for reference point ({latitude}, {longitude})")]
    MapDetection { latitude: f64, longitude: f64 },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Translate a transport error raised while listing servers.
    pub fn discovery(err: &skyglass_api::Error) -> Self {
        Self::DiscoveryFailed {
            reason: err.to_string(),
            transient: err.is_transient(),
        }
    }

    /// Translate a transport error raised while fetching `server`'s state.
    pub fn session(server: &str, err: &skyglass_api::Error) -> Self {
        if err.is_not_found() {
            Self::SessionNotFound {
                server: server.to_owned(),
            }
        } else {
            Self::SessionFetch {
                server: server.to_owned(),
                reason: err.to_string(),
            }
        }
    }
}
