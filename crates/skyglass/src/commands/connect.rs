//! Interactive session: pick a server, follow its map until told to stop.

use std::io::IsTerminal;
use std::time::Duration;

use dialoguer::{Confirm, Select};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use skyglass_api::ApiClient;
use skyglass_core::{
    ClientConfig, DiscoveryStatus, MapDefinition, MapId, MapRegistry, MapSelector,
    ReferenceCoordinate, Route, Router, SessionPhase, ViewState, discovery_view, session_view,
};

use crate::cli::{ConnectArgs, GlobalOpts, OutputFormat};
use crate::error::{CliError, prompt_err};
use crate::output::{self, Palette};

/// How a watched session ended.
enum Outcome {
    /// The server vanished; back to discovery.
    Redirected,
    /// Ctrl-C, `--once`, or the store went away.
    Finished,
}

#[derive(Serialize)]
struct Resolution<'a> {
    server: &'a str,
    map: &'a str,
    reference: Option<ReferenceCoordinate>,
    /// RFC 3339 time the resolved state was fetched.
    updated_at: Option<String>,
}

pub async fn handle(
    client: &ClientConfig,
    args: ConnectArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let router = super::router(client)?;
    let palette = Palette::new(&global.color);
    let mut requested = args.server;

    let result = loop {
        let name = match requested.take() {
            Some(name) => name,
            None => match pick_server(&router).await {
                Ok(name) => name,
                Err(e) => break Err(e),
            },
        };

        if !global.quiet {
            eprintln!(
                "Connecting to {} {}",
                palette.accent(&name),
                palette.dim(&format!(
                    "(polling every {})",
                    humantime::format_duration(client.poll_interval)
                ))
            );
        }
        router.navigate(Route::server(&name)).await;

        match watch_session(&router, &name, args.once, global, palette).await {
            Ok(Outcome::Redirected) => {
                if !interactive() {
                    break Err(CliError::ServerNotFound { name });
                }
                eprintln!("Server '{name}' no longer exists; returning to server selection");
            }
            Ok(Outcome::Finished) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    router.controller().detach().await;
    result
}

fn interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

// ── Discovery ───────────────────────────────────────────────────────

/// Load the server list and let the user choose, offering a retry when the
/// backend is unreachable.
async fn pick_server(router: &Router<ApiClient>) -> Result<String, CliError> {
    if !interactive() {
        return Err(CliError::NonInteractive {
            action: "server selection".into(),
        });
    }

    router.navigate(Route::Root).await;
    loop {
        match discovery_view(&router.discovery().status()) {
            ViewState::Ready(servers) => {
                if servers.is_empty() {
                    return Err(CliError::NoServers);
                }
                let names: Vec<&str> = servers.iter().map(|s| s.name.as_str()).collect();
                let choice = Select::new()
                    .with_prompt("Select server")
                    .items(&names)
                    .default(0)
                    .interact()
                    .map_err(prompt_err)?;
                return Ok(names[choice].to_owned());
            }
            ViewState::Error { message, retryable } => {
                eprintln!("{message}");
                let again = retryable
                    && Confirm::new()
                        .with_prompt("Try again?")
                        .default(true)
                        .interact()
                        .map_err(prompt_err)?;
                if !again {
                    let reason = match router.discovery().status() {
                        DiscoveryStatus::Failed { message } => message,
                        _ => message,
                    };
                    return Err(CliError::DiscoveryFailed { reason });
                }
                let _ = router.discovery().retry().await;
            }
            ViewState::Loading | ViewState::Redirect(_) => {
                let _ = router.discovery().list().await;
            }
        }
    }
}

// ── Session ─────────────────────────────────────────────────────────

async fn watch_session(
    router: &Router<ApiClient>,
    server: &str,
    once: bool,
    global: &GlobalOpts,
    palette: Palette,
) -> Result<Outcome, CliError> {
    let spinner = spinner(global.quiet);
    spinner.set_message(format!("Loading {server}..."));

    let mut selector = MapSelector::new(router.store(), MapRegistry::builtin());
    let mut phase = router.controller().subscribe_phase();
    let mut shown: Option<MapId> = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let current = router.controller().phase();
        match session_view(&current, selector.current()) {
            ViewState::Loading => {}
            ViewState::Redirect(_) => {
                spinner.finish_and_clear();
                router.redirect_if_needed().await;
                return Ok(Outcome::Redirected);
            }
            ViewState::Error { message, .. } => {
                spinner.finish_and_clear();
                if let Some(err) = selector.current().error() {
                    return Err(err.into());
                }
                let reason = match current {
                    SessionPhase::Failed { message, .. } => message,
                    _ => message,
                };
                return Err(CliError::SessionFailed {
                    server: server.to_owned(),
                    reason,
                });
            }
            ViewState::Ready(map) => {
                if shown != Some(map.id) {
                    shown = Some(map.id);
                    let line = render_resolution(router, server, &map, global, palette);
                    spinner.suspend(|| output::print_output(&line, global.quiet));
                    spinner.set_message(format!("Following {server}..."));
                }
                if once {
                    spinner.finish_and_clear();
                    return Ok(Outcome::Finished);
                }
            }
        }

        tokio::select! {
            _ = &mut ctrl_c => {
                spinner.finish_and_clear();
                info!(server, "interrupted, detaching session");
                return Ok(Outcome::Finished);
            }
            changed = phase.changed() => {
                if changed.is_err() {
                    return Ok(Outcome::Finished);
                }
            }
            selection = selector.changed() => {
                if selection.is_none() {
                    return Ok(Outcome::Finished);
                }
                debug!(server, "map selection changed");
            }
        }
    }
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn render_resolution(
    router: &Router<ApiClient>,
    server: &str,
    map: &MapDefinition,
    global: &GlobalOpts,
    palette: Palette,
) -> String {
    let snapshot = router.store().snapshot();
    let resolution = Resolution {
        server,
        map: map.name,
        reference: snapshot
            .server
            .as_deref()
            .and_then(ReferenceCoordinate::from_state),
        updated_at: snapshot.updated_at.map(|t| t.to_rfc3339()),
    };
    match global.output {
        // One object per line so the stream stays parseable.
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_single(
            &OutputFormat::JsonCompact,
            &resolution,
            |_| String::new(),
            |_| String::new(),
        ),
        _ => output::render_single(
            &global.output,
            &resolution,
            |r| {
                let at = r.reference.map(|c| c.to_string()).unwrap_or_default();
                let when = snapshot
                    .updated_at
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_default();
                format!(
                    "{} {} {} {} {}",
                    palette.good("●"),
                    r.server,
                    palette.accent(r.map),
                    palette.dim(&at),
                    palette.dim(&when)
                )
            },
            |r| r.map.to_owned(),
        ),
    }
}
