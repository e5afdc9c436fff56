//! One-shot server state fetch.

use tabled::Tabled;

use skyglass_api::{ApiClient, CachePolicy, Entity, ServerState};
use skyglass_core::selector::{self, MapSelection};
use skyglass_core::{ClientConfig, CoreError, MapRegistry, ReferenceCoordinate};

use crate::cli::{GlobalOpts, StateArgs};
use crate::error::CliError;
use crate::output::{self, Palette};

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Properties")]
    properties: String,
}

impl From<&Entity> for EntityRow {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id,
            properties: e
                .properties
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

pub async fn handle(
    client: &ClientConfig,
    args: StateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let api = ApiClient::new(&client.transport()).map_err(|e| CliError::Validation {
        field: "transport".into(),
        reason: e.to_string(),
    })?;
    let state = api
        .server_state(&args.server, CachePolicy::NoCache)
        .await
        .map_err(|e| CoreError::session(&args.server, &e))?;

    let palette = Palette::new(&global.color);
    let out = output::render_single(
        &global.output,
        &state,
        |s| detail(&args.server, s, palette),
        |s| {
            s.entities
                .keys()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(server: &str, state: &ServerState, palette: Palette) -> String {
    let reference = ReferenceCoordinate::from_state(state)
        .map_or_else(|| "(none)".to_owned(), |c| c.to_string());
    let map = match selector::select(Some(state), &MapRegistry::builtin()) {
        MapSelection::AwaitingReference => palette.dim("(awaiting reference)"),
        MapSelection::Resolved { map } => palette.accent(map.name),
        MapSelection::DetectionFailed { .. } => "Failed to detect map.".to_owned(),
    };

    let rows: Vec<EntityRow> = state.entities.values().map(EntityRow::from).collect();
    format!(
        "Server:    {}\nReference: {reference}\nMap:       {map}\nEntities:  {}\n\n{}",
        palette.accent(server),
        rows.len(),
        output::render_table(&rows)
    )
}
