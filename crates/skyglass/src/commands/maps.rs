//! Map catalogue and geofencing handlers.

use tabled::Tabled;
use tracing::warn;

use skyglass_core::geo;
use skyglass_core::{MapDefinition, MapRegistry, ReferenceCoordinate};

use crate::cli::{GlobalOpts, MapsArgs, MapsCommand};
use crate::error::CliError;
use crate::output::{self, Palette};

#[derive(Tabled)]
struct MapRow {
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Latitude")]
    latitude: String,
    #[tabled(rename = "Longitude")]
    longitude: String,
}

fn map_row(m: &MapDefinition) -> MapRow {
    let b = m.bounding_box;
    MapRow {
        name: m.name,
        latitude: format!("({}, {})", b.lat_min, b.lat_max),
        longitude: format!("({}, {})", b.lng_min, b.lng_max),
    }
}

pub fn handle(args: MapsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let registry = MapRegistry::builtin();

    match args.command {
        MapsCommand::List => {
            let maps: Vec<MapDefinition> = registry.iter().cloned().collect();
            let out = output::render_list(&global.output, &maps, map_row, |m| {
                m.name.to_owned()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MapsCommand::Resolve {
            latitude,
            longitude,
        } => {
            let point = ReferenceCoordinate::new(latitude, longitude);
            let Some(map) = geo::resolve(&registry, point) else {
                warn!(latitude, longitude, "reference point outside every known map");
                return Err(CliError::MapDetection {
                    latitude,
                    longitude,
                });
            };

            let palette = Palette::new(&global.color);
            let out = output::render_single(
                &global.output,
                map,
                |m| format!("{point} → {}", palette.accent(m.name)),
                |m| m.name.to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
