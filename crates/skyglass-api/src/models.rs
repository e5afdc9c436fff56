// Wire models for the discovery and session endpoints.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Numeric identifier of an entity within one server's state.
pub type EntityId = i64;

/// Entry of `GET /api/servers`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerDescriptor {
    pub name: String,
}

/// A single entity property value.
///
/// Scalars get typed variants; anything else (`null`, arrays, objects) is
/// kept verbatim in `Other` so one odd field never fails the whole state.
/// Variant order matters for untagged decoding (`true` must not become a
/// string, `1` must not become a bool).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

/// One live object reported by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Entity {
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// Full state snapshot of one server, as returned by `GET /api/servers/{name}`.
///
/// Only `entities` is interpreted; every other top-level field is kept
/// verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerState {
    #[serde(default, deserialize_with = "entities_by_id")]
    pub entities: BTreeMap<EntityId, Entity>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ServerState {
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }
}

/// JSON object keys arrive as strings. Parsed by hand because `flatten`
/// buffers the document and loses serde_json's integer-key coercion.
fn entities_by_id<'de, D>(deserializer: D) -> Result<BTreeMap<EntityId, Entity>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, Entity>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, entity)| {
            key.trim()
                .parse::<EntityId>()
                .map(|id| (id, entity))
                .map_err(|_| D::Error::custom(format!("invalid entity id `{key}`")))
        })
        .collect()
}
