// ── Known map catalogue ──
//
// Static set of map definitions with the bounding boxes used for
// geofencing. Registry order is the resolution order.

use std::borrow::Cow;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::geo::ReferenceCoordinate;

/// Identifier of a built-in map.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum MapId {
    Syria,
    Caucasus,
}

/// Geographic box in degrees. Containment is exclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl BoundingBox {
    pub const fn new(lat_min: f64, lat_max: f64, lng_min: f64, lng_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lng_min,
            lng_max,
        }
    }

    /// Strict containment: points on an edge are outside. NaN is never inside.
    pub fn contains(&self, point: ReferenceCoordinate) -> bool {
        self.lat_min < point.latitude
            && point.latitude < self.lat_max
            && self.lng_min < point.longitude
            && point.longitude < self.lng_max
    }

    pub fn center(&self) -> ReferenceCoordinate {
        ReferenceCoordinate {
            latitude: (self.lat_min + self.lat_max) / 2.0,
            longitude: (self.lng_min + self.lng_max) / 2.0,
        }
    }
}

/// A known map and the region it covers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapDefinition {
    pub id: MapId,
    pub name: &'static str,
    pub bounding_box: BoundingBox,
}

pub const SYRIA: MapDefinition = MapDefinition {
    id: MapId::Syria,
    name: "Syria",
    bounding_box: BoundingBox::new(28.0, 32.0, 29.0, 33.0),
};

pub const CAUCASUS: MapDefinition = MapDefinition {
    id: MapId::Caucasus,
    name: "Caucasus",
    bounding_box: BoundingBox::new(37.0, 41.0, 34.0, 38.0),
};

static BUILTIN: [MapDefinition; 2] = [SYRIA, CAUCASUS];

/// Ordered catalogue of map definitions.
#[derive(Debug, Clone)]
pub struct MapRegistry {
    maps: Cow<'static, [MapDefinition]>,
}

impl MapRegistry {
    /// The catalogue shipped with the client.
    pub fn builtin() -> Self {
        Self {
            maps: Cow::Borrowed(&BUILTIN),
        }
    }

    /// A custom catalogue. Order is preserved and decides overlaps.
    pub fn new(maps: Vec<MapDefinition>) -> Self {
        Self {
            maps: Cow::Owned(maps),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapDefinition> {
        self.maps.iter()
    }

    pub fn get(&self, id: MapId) -> Option<&MapDefinition> {
        self.maps.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl Default for MapRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
