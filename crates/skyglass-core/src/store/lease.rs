// ── Scoped session ownership ──
//
// A lease is the store-side half of one session: creating it (via
// `SessionStore::claim`) empties the store for the new selection, and
// dropping it empties the store again. Writers derived from a lease only
// succeed while that lease is still the current owner.

use std::sync::Arc;

use skyglass_api::ServerState;
use tracing::trace;

use super::SessionStore;

/// Exclusive, scoped ownership of the [`SessionStore`] for one session.
///
/// Dropping the lease resets the store to empty unless a newer session has
/// already claimed it, so cleanup runs on every exit path, including a
/// cancelled fetch or a panic unwinding through the owner.
#[must_use = "dropping a lease immediately resets the store"]
pub struct SessionLease {
    store: Arc<SessionStore>,
    epoch: u64,
    server: String,
}

impl SessionLease {
    pub(super) fn new(store: Arc<SessionStore>, epoch: u64, server: String) -> Self {
        Self {
            store,
            epoch,
            server,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// `false` once another session has claimed the store.
    pub fn is_current(&self) -> bool {
        self.store.owns(self.epoch)
    }

    /// A cloneable write handle for background fetch tasks.
    pub fn writer(&self) -> SessionWriter {
        SessionWriter {
            store: Arc::clone(&self.store),
            epoch: self.epoch,
        }
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        if !self.store.release(self.epoch) {
            trace!(server = %self.server, epoch = self.epoch, "lease already superseded");
        }
    }
}

/// Guarded write access for one session epoch.
///
/// Every write re-checks ownership at write time, so a response that
/// arrives after the selection changed is discarded.
#[derive(Clone)]
pub struct SessionWriter {
    store: Arc<SessionStore>,
    epoch: u64,
}

impl SessionWriter {
    /// Replace the resident snapshot. Returns `false` if the write was discarded.
    pub fn publish(&self, state: ServerState) -> bool {
        self.store.publish(self.epoch, state)
    }

    /// Drop the resident snapshot while keeping ownership.
    pub fn clear(&self) -> bool {
        self.store.clear(self.epoch)
    }

    pub fn is_current(&self) -> bool {
        self.store.owns(self.epoch)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
