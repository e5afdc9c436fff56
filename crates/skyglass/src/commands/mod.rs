//! Command dispatch: bridges CLI args -> core session logic -> output formatting.

pub mod config_cmd;
pub mod connect;
pub mod maps;
pub mod servers;
pub mod state;

use skyglass_api::ApiClient;
use skyglass_core::{ClientConfig, Router};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &ClientConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Servers(args) => servers::handle(client, args, global).await,
        Command::Connect(args) => connect::handle(client, args, global).await,
        Command::State(args) => state::handle(client, args, global).await,
        // Maps, Config and Completions are handled before dispatch
        Command::Maps(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Wire discovery, the session controller and the store for `client`.
fn router(client: &ClientConfig) -> Result<Router<ApiClient>, CliError> {
    Ok(Router::from_config(client)?)
}
