// ── Map selection ──
//
// Derives the map to render from the session store: read the reference
// coordinate from entity 0, then geofence it against the registry.

use serde::Serialize;
use skyglass_api::ServerState;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::geo::{self, ReferenceCoordinate};
use crate::registry::{MapDefinition, MapRegistry};
use crate::store::SessionStore;
use crate::stream::ServerStream;

/// Outcome of map detection for the current store contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MapSelection {
    /// No reference point yet. Not an error.
    AwaitingReference,
    Resolved { map: MapDefinition },
    /// A reference point exists but lies outside every known map.
    DetectionFailed { coordinate: ReferenceCoordinate },
}

impl MapSelection {
    pub fn map(&self) -> Option<&MapDefinition> {
        match self {
            Self::Resolved { map } => Some(map),
            _ => None,
        }
    }

    /// The user-visible error for a failed detection.
    pub fn error(&self) -> Option<CoreError> {
        match self {
            Self::DetectionFailed { coordinate } => Some(CoreError::MapDetection {
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
            }),
            _ => None,
        }
    }
}

/// Classify `state` against `registry`. Pure; does not log.
pub fn select(state: Option<&ServerState>, registry: &MapRegistry) -> MapSelection {
    let Some(coordinate) = state.and_then(ReferenceCoordinate::from_state) else {
        return MapSelection::AwaitingReference;
    };
    match geo::resolve(registry, coordinate) {
        Some(map) => MapSelection::Resolved { map: map.clone() },
        None => MapSelection::DetectionFailed { coordinate },
    }
}

/// Keeps a [`MapSelection`] in sync with a [`SessionStore`].
///
/// Re-evaluates on every store change, so a reference point that moves
/// between polls re-resolves without restarting the session.
pub struct MapSelector {
    registry: MapRegistry,
    stream: ServerStream,
    current: MapSelection,
}

impl MapSelector {
    pub fn new(store: &SessionStore, registry: MapRegistry) -> Self {
        let stream = store.subscribe();
        let current = select(stream.current().server.as_deref(), &registry);
        let selector = Self {
            registry,
            stream,
            current,
        };
        selector.report();
        selector
    }

    pub fn current(&self) -> &MapSelection {
        &self.current
    }

    /// Wait until the selection differs from [`current()`](Self::current).
    ///
    /// Store changes that leave the outcome unchanged (e.g. a poll with the
    /// same reference point) are skipped. Returns `None` once the store is
    /// gone.
    pub async fn changed(&mut self) -> Option<MapSelection> {
        loop {
            let snapshot = self.stream.changed().await?;
            let next = select(snapshot.server.as_deref(), &self.registry);
            if next != self.current {
                self.current = next;
                self.report();
                return Some(self.current.clone());
            }
        }
    }

    fn report(&self) {
        match &self.current {
            MapSelection::AwaitingReference => debug!("awaiting reference point"),
            MapSelection::Resolved { map } => debug!(map = map.name, "map resolved"),
            MapSelection::DetectionFailed { coordinate } => warn!(
                latitude = coordinate.latitude,
                longitude = coordinate.longitude,
                "reference point outside every known map"
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::registry::{CAUCASUS, MapId, SYRIA};

    fn state(value: serde_json::Value) -> ServerState {
        serde_json::from_value(value).unwrap()
    }

    fn reference(lat: f64, lng: f64) -> ServerState {
        state(json!({
            "entities": {
                "0": { "id": 0, "properties": { "ReferenceLatitude": lat, "ReferenceLongitude": lng } }
            }
        }))
    }

    #[test]
    fn empty_store_awaits_reference() {
        assert_eq!(
            select(None, &MapRegistry::builtin()),
            MapSelection::AwaitingReference
        );
    }

    #[test]
    fn incomplete_reference_awaits_repeatedly() {
        let registry = MapRegistry::builtin();
        let polls = [
            state(json!({ "entities": {} })),
            state(json!({ "entities": { "0": { "id": 0, "properties": {} } } })),
            state(json!({ "entities": { "0": { "id": 0, "properties": { "ReferenceLatitude": 30 } } } })),
            state(json!({ "entities": { "5": { "id": 5, "properties": { "ReferenceLatitude": 30, "ReferenceLongitude": 31 } } } })),
        ];
        for _ in 0..3 {
            for poll in &polls {
                assert_eq!(select(Some(poll), &registry), MapSelection::AwaitingReference);
            }
        }
    }

    #[test]
    fn reference_inside_known_map_resolves() {
        let registry = MapRegistry::builtin();
        assert_eq!(
            select(Some(&reference(30.0, 31.0)), &registry),
            MapSelection::Resolved { map: SYRIA }
        );
        assert_eq!(
            select(Some(&reference(39.0, 36.0)), &registry).map().map(|m| m.id),
            Some(MapId::Caucasus)
        );
    }

    #[test]
    fn reference_outside_every_map_fails_detection() {
        let selection = select(Some(&reference(0.0, 0.0)), &MapRegistry::builtin());
        assert_eq!(
            selection,
            MapSelection::DetectionFailed {
                coordinate: ReferenceCoordinate::new(0.0, 0.0)
            }
        );
        assert!(matches!(
            selection.error(),
            Some(CoreError::MapDetection { latitude, longitude }) if latitude == 0.0 && longitude == 0.0
        ));
    }

    #[test]
    fn zero_coordinate_is_a_reference_not_a_gap() {
        // (0, 0) is a real point; it fails detection rather than waiting.
        let selection = select(Some(&reference(0.0, 31.0)), &MapRegistry::builtin());
        assert!(matches!(selection, MapSelection::DetectionFailed { .. }));
    }

    #[tokio::test]
    async fn selector_follows_store_changes() {
        let store = Arc::new(SessionStore::new());
        let mut selector = MapSelector::new(&store, MapRegistry::builtin());
        assert_eq!(selector.current(), &MapSelection::AwaitingReference);

        let lease = store.claim("Alpha");
        let writer = lease.writer();

        writer.publish(reference(30.0, 31.0));
        assert_eq!(
            selector.changed().await,
            Some(MapSelection::Resolved { map: SYRIA })
        );

        // Same outcome: no notification. Next distinct outcome is reported.
        writer.publish(reference(30.5, 31.5));
        writer.publish(reference(39.0, 36.0));
        assert_eq!(
            selector.changed().await,
            Some(MapSelection::Resolved { map: CAUCASUS })
        );

        drop(lease);
        assert_eq!(
            selector.changed().await,
            Some(MapSelection::AwaitingReference)
        );
    }

    /// In-memory sink for a test subscriber.
    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn detection_failure_keeps_and_logs_the_coordinate() {
        let store = Arc::new(SessionStore::new());
        let lease = store.claim("Alpha");
        lease.writer().publish(reference(50.25, 10.5));

        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let selector = tracing::subscriber::with_default(subscriber, || {
            MapSelector::new(&store, MapRegistry::builtin())
        });

        assert_eq!(
            selector.current(),
            &MapSelection::DetectionFailed {
                coordinate: ReferenceCoordinate::new(50.25, 10.5)
            }
        );
        let logged = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("WARN"), "{logged}");
        assert!(logged.contains("latitude=50.25"), "{logged}");
        assert!(logged.contains("longitude=10.5"), "{logged}");
    }
}
