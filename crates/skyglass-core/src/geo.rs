// ── Geofencing ──
//
// Classifies a server's reference coordinate into one of the registry's
// map regions. Pure and deterministic: first containing box in registry
// order wins.

use serde::Serialize;
use skyglass_api::{EntityId, ServerState};

use crate::registry::{MapDefinition, MapRegistry};

/// Well-known entity carrying the server's reference point.
pub const REFERENCE_ENTITY_ID: EntityId = 0;
pub const REFERENCE_LATITUDE: &str = "ReferenceLatitude";
pub const REFERENCE_LONGITUDE: &str = "ReferenceLongitude";

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl ReferenceCoordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Read the reference point from entity `0` of a server state.
    ///
    /// `None` if the entity is missing or either property is absent or
    /// not a number.
    pub fn from_state(state: &ServerState) -> Option<Self> {
        let global = state.entity(REFERENCE_ENTITY_ID)?;
        let latitude = global.property(REFERENCE_LATITUDE)?.as_f64()?;
        let longitude = global.property(REFERENCE_LONGITUDE)?.as_f64()?;
        Some(Self::new(latitude, longitude))
    }
}

impl std::fmt::Display for ReferenceCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Find the map whose bounding box strictly contains `point`.
///
/// Returns the first match in registry order, or `None` when the point is
/// outside every region.
pub fn resolve(registry: &MapRegistry, point: ReferenceCoordinate) -> Option<&MapDefinition> {
    registry
        .iter()
        .find(|map| map.bounding_box.contains(point))
}

impl MapRegistry {
    /// See [`resolve`].
    pub fn resolve(&self, latitude: f64, longitude: f64) -> Option<&MapDefinition> {
        resolve(self, ReferenceCoordinate::new(latitude, longitude))
    }
}
