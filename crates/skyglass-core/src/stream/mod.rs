// ── Reactive store subscriptions ──
//
// Subscription types for consuming session store changes.

use tokio::sync::watch;

use crate::store::StoreSnapshot;

/// A subscription to the [`SessionStore`](crate::store::SessionStore).
///
/// Holds the snapshot seen last and waits for the next one via `changed()`.
pub struct ServerStream {
    current: StoreSnapshot,
    receiver: watch::Receiver<StoreSnapshot>,
}

impl ServerStream {
    pub(crate) fn new(mut receiver: watch::Receiver<StoreSnapshot>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The snapshot seen by the last `changed()` (or at creation).
    pub fn current(&self) -> &StoreSnapshot {
        &self.current
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<StoreSnapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }
}
