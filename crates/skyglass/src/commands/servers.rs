//! Server discovery handlers.

use tabled::Tabled;

use skyglass_core::{ClientConfig, Route};

use crate::cli::{GlobalOpts, ServersArgs, ServersCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ServerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Route")]
    route: String,
}

pub async fn handle(
    client: &ClientConfig,
    args: ServersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ServersCommand::List => {
            let router = super::router(client)?;
            let servers = router.discovery().list().await?;

            if servers.is_empty() && !global.quiet {
                eprintln!("No servers available");
            }

            let out = output::render_list(
                &global.output,
                servers.as_slice(),
                |s| ServerRow {
                    name: s.name.clone(),
                    route: Route::server(&s.name).path(),
                },
                |s| s.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
