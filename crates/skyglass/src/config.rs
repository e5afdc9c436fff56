//! CLI configuration: thin wrapper around `skyglass_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--origin, --dev, --insecure, --timeout, --poll-interval).

use std::time::Duration;

use skyglass_api::ApiBase;
use skyglass_config::ConfigError;
use skyglass_core::{ClientConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use skyglass_config::{
    Config, Mode, Profile, co_located_base, config_path, load_config, load_config_or_default,
    save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ClientConfig` from the config file, profile, and CLI overrides.
///
/// Flags take priority over the profile, which takes priority over
/// `[defaults]`. Without any profile the development backend is used.
pub fn resolve_client_config(global: &GlobalOpts, cfg: &Config) -> Result<ClientConfig, CliError> {
    let profile = match cfg.profile(global.profile.as_deref()) {
        Ok(profile) => profile,
        Err(ConfigError::UnknownProfile { name }) => {
            let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        Err(e) => return Err(e.into()),
    };

    let mut client = match profile {
        Some((_, profile)) => profile.to_client_config(&cfg.defaults)?,
        None => ClientConfig {
            timeout: Duration::from_secs(cfg.defaults.timeout),
            poll_interval: Duration::from_secs(cfg.defaults.poll_interval),
            ..ClientConfig::default()
        },
    };

    if global.dev {
        client.api_base = ApiBase::development();
    } else if let Some(ref origin) = global.origin {
        client.api_base = co_located_base(origin)?;
    }

    if global.insecure {
        client.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        client.timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = global.poll_interval {
        client.poll_interval = Duration::from_secs(secs);
    }

    tracing::debug!(api_base = %client.api_base, "resolved client config");
    Ok(client)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["skyglass"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["maps", "list"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_ops() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "ops".into(),
            Profile {
                mode: Mode::CoLocated,
                origin: Some("https://ops.example.org".into()),
                poll_interval: Some(2),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn no_profile_falls_back_to_development() {
        let client = resolve_client_config(&global(&[]), &Config::default()).unwrap();
        assert_eq!(client.api_base.as_str(), "http://localhost:7789/api/");
        assert_eq!(client.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn flags_override_profile() {
        let cfg = config_with_ops();
        let client = resolve_client_config(
            &global(&["-p", "ops", "--origin", "http://127.0.0.1:9000", "--poll-interval", "0"]),
            &cfg,
        )
        .unwrap();
        assert_eq!(client.api_base.as_str(), "http://127.0.0.1:9000/api/");
        assert_eq!(client.poll_interval, Duration::ZERO);

        let dev = resolve_client_config(&global(&["-p", "ops", "--dev", "-k"]), &cfg).unwrap();
        assert_eq!(dev.api_base.as_str(), "http://localhost:7789/api/");
        assert_eq!(dev.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(dev.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn unknown_profile_lists_available() {
        let err = resolve_client_config(&global(&["-p", "nope"]), &config_with_ops()).unwrap_err();
        assert!(matches!(
            err,
            CliError::ProfileNotFound { ref available, .. } if available == "ops"
        ));
    }
}
