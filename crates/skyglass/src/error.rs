//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use skyglass_config::ConfigError;
use skyglass_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const MAP_DETECTION: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Backend ──────────────────────────────────────────────────────
    #[error("Could not list servers: {reason}")]
    #[diagnostic(
        code(skyglass::discovery_failed),
        help(
            "Something went wrong accessing the backend server.\n\
             Check your connection and try again: skyglass servers list\n\
             Use --dev for the local backend or --origin for a hosted one."
        )
    )]
    DiscoveryFailed { reason: String },

    #[error("Server '{name}' not found")]
    #[diagnostic(
        code(skyglass::server_not_found),
        help("Run: skyglass servers list to see available servers")
    )]
    ServerNotFound { name: String },

    #[error("Could not fetch state of server '{server}': {reason}")]
    #[diagnostic(
        code(skyglass::session_failed),
        help("Check that the server is still running, then connect again.")
    )]
    SessionFailed { server: String, reason: String },

    #[error("No servers available")]
    #[diagnostic(
        code(skyglass::no_servers),
        help("The backend is reachable but reports no servers.")
    )]
    NoServers,

    // ── Map resolution ───────────────────────────────────────────────
    #[error("Failed to detect map.")]
    #[diagnostic(
        code(skyglass::map_detection),
        help(
            "Reference point ({latitude}, {longitude}) lies outside every known map.\n\
             Run: skyglass maps list"
        )
    )]
    MapDetection { latitude: f64, longitude: f64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(skyglass::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(skyglass::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: skyglass config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(skyglass::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' needs an interactive terminal")]
    #[diagnostic(
        code(skyglass::non_interactive),
        help("Pass the server name explicitly: skyglass connect <SERVER>")
    )]
    NonInteractive { action: String },

    #[error("Prompt failed: {0}")]
    #[diagnostic(code(skyglass::prompt))]
    Prompt(String),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DiscoveryFailed { .. } | Self::SessionFailed { .. } => exit_code::CONNECTION,
            Self::ServerNotFound { .. } | Self::NoServers | Self::ProfileNotFound { .. } => {
                exit_code::NOT_FOUND
            }
            Self::MapDetection { .. } => exit_code::MAP_DETECTION,
            Self::Validation { .. } | Self::NonInteractive { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

/// Map a dialoguer failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Prompt(e.to_string())
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DiscoveryFailed { reason, .. } => CliError::DiscoveryFailed { reason },
            CoreError::SessionNotFound { server } => CliError::ServerNotFound { name: server },
            CoreError::SessionFetch { server, reason } => CliError::SessionFailed { server, reason },
            CoreError::MapDetection {
                latitude,
                longitude,
            } => CliError::MapDetection {
                latitude,
                longitude,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let not_found: CliError = CoreError::SessionNotFound {
            server: "Alpha".into(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let fetch: CliError = CoreError::SessionFetch {
            server: "Alpha".into(),
            reason: "HTTP 500".into(),
        }
        .into();
        assert_eq!(fetch.exit_code(), exit_code::CONNECTION);

        let detect: CliError = CoreError::MapDetection {
            latitude: 0.0,
            longitude: 0.0,
        }
        .into();
        assert_eq!(detect.exit_code(), exit_code::MAP_DETECTION);
        assert_eq!(detect.to_string(), "Failed to detect map.");
    }

    #[test]
    fn config_validation_is_usage_error() {
        let err: CliError = ConfigError::Validation {
            field: "origin".into(),
            reason: "bad".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
