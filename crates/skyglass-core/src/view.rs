// ── View states ──
//
// Every failure is resolved at the component that produced it and folded
// into one of four states a consumer knows how to present.

use std::sync::Arc;

use skyglass_api::ServerDescriptor;

use crate::controller::SessionPhase;
use crate::discovery::DiscoveryStatus;
use crate::registry::MapDefinition;
use crate::route::Route;
use crate::selector::MapSelection;

pub const DISCOVERY_ERROR: &str = "Something went wrong accessing the backend server. \
     Please check your connection and try again.";
pub const MAP_DETECTION_ERROR: &str = "Failed to detect map.";

/// What a consumer should present.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Error { message: String, retryable: bool },
    Redirect(Route),
    Ready(T),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Discovery failures are retryable through [`ServerDiscovery::retry`](crate::ServerDiscovery::retry).
pub fn discovery_view(status: &DiscoveryStatus) -> ViewState<Arc<Vec<ServerDescriptor>>> {
    match status {
        DiscoveryStatus::Loading => ViewState::Loading,
        DiscoveryStatus::Failed { .. } => ViewState::Error {
            message: DISCOVERY_ERROR.to_owned(),
            retryable: true,
        },
        DiscoveryStatus::Ready(servers) => ViewState::Ready(Arc::clone(servers)),
    }
}

/// Combine the session phase with the map selection for the session screen.
///
/// Session outcomes take precedence: a missing server redirects and a
/// fetch error is shown as-is, whatever the store last held.
pub fn session_view(phase: &SessionPhase, selection: &MapSelection) -> ViewState<MapDefinition> {
    match phase {
        SessionPhase::NotFound { .. } => ViewState::Redirect(Route::Root),
        SessionPhase::Failed { message, .. } => ViewState::Error {
            message: format!("Error: {message}"),
            retryable: false,
        },
        SessionPhase::Idle | SessionPhase::Fetching { .. } => ViewState::Loading,
        SessionPhase::Ready { .. } => match selection {
            MapSelection::AwaitingReference => ViewState::Loading,
            MapSelection::DetectionFailed { .. } => ViewState::Error {
                message: MAP_DETECTION_ERROR.to_owned(),
                retryable: false,
            },
            MapSelection::Resolved { map } => ViewState::Ready(map.clone()),
        },
    }
}
