// ── Session store ──
//
// Process-wide holder of the selected server's state snapshot. One `watch`
// slot carries the snapshot together with the epoch of the session that
// owns it, so ownership checks and writes happen under the same lock.

mod lease;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use skyglass_api::{Entity, EntityId, ServerState};
use tokio::sync::watch;
use tracing::debug;

use crate::stream::ServerStream;

pub use lease::{SessionLease, SessionWriter};

/// Consistent view of the store at one instant.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Session that owns the slot. Bumped on every claim and release.
    pub(crate) epoch: u64,
    /// Server name of the owning session, if any.
    pub selection: Option<String>,
    /// Last state installed by the owning session.
    pub server: Option<Arc<ServerState>>,
    /// When `server` was installed.
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoreSnapshot {
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.server.as_ref()?.entity(id)
    }
}

/// Shared store for the active session's server state.
///
/// Readers use [`server()`](Self::server), [`entity()`](Self::entity) or a
/// [`ServerStream`] subscription. The only writer is the [`SessionLease`]
/// held by the active session; a lease that has been superseded can no
/// longer write, and dropping the current lease resets the store.
pub struct SessionStore {
    slot: watch::Sender<StoreSnapshot>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(StoreSnapshot::default());
        Self { slot }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The resident server state, if a session has installed one.
    pub fn server(&self) -> Option<Arc<ServerState>> {
        self.slot.borrow().server.clone()
    }

    /// Name of the server whose session currently owns the store.
    pub fn selection(&self) -> Option<String> {
        self.slot.borrow().selection.clone()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.slot.borrow().clone()
    }

    pub fn entity(&self, id: EntityId) -> Option<Entity> {
        self.slot.borrow().entity(id).cloned()
    }

    pub fn entity_count(&self) -> usize {
        self.slot
            .borrow()
            .server
            .as_ref()
            .map_or(0, |s| s.entities.len())
    }

    /// When the resident snapshot was last replaced.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.slot.borrow().updated_at
    }

    pub fn subscribe(&self) -> ServerStream {
        ServerStream::new(self.slot.subscribe())
    }

    // ── Session ownership ────────────────────────────────────────────

    /// Hand the store to a new session for `server`.
    ///
    /// Any previous snapshot is dropped before this returns, and every
    /// lease or writer issued earlier stops being able to write.
    pub(crate) fn claim(self: &Arc<Self>, server: &str) -> SessionLease {
        let mut epoch = 0;
        self.slot.send_modify(|slot| {
            slot.epoch += 1;
            slot.selection = Some(server.to_owned());
            slot.server = None;
            slot.updated_at = None;
            epoch = slot.epoch;
        });
        debug!(server, epoch, "session claimed store");
        SessionLease::new(Arc::clone(self), epoch, server.to_owned())
    }

    /// Install `state` if `epoch` still owns the slot.
    fn publish(&self, epoch: u64, state: ServerState) -> bool {
        self.slot.send_if_modified(|slot| {
            if slot.epoch != epoch {
                return false;
            }
            slot.server = Some(Arc::new(state));
            slot.updated_at = Some(Utc::now());
            true
        })
    }

    /// Drop the snapshot but keep ownership.
    fn clear(&self, epoch: u64) -> bool {
        self.slot.send_if_modified(|slot| {
            if slot.epoch != epoch || slot.server.is_none() {
                return false;
            }
            slot.server = None;
            slot.updated_at = None;
            true
        })
    }

    /// End ownership of `epoch`, resetting the store to empty.
    fn release(&self, epoch: u64) -> bool {
        let released = self.slot.send_if_modified(|slot| {
            if slot.epoch != epoch {
                return false;
            }
            slot.epoch += 1;
            slot.selection = None;
            slot.server = None;
            slot.updated_at = None;
            true
        });
        if released {
            debug!(epoch, "session released store");
        }
        released
    }

    fn owns(&self, epoch: u64) -> bool {
        self.slot.borrow().epoch == epoch
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
