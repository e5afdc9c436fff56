// ── Session controller ──
//
// Binds the selected server to the session store. Each selection claims
// the store through a lease, spawns a background task that polls the
// server's state with no-cache requests, and publishes successful
// snapshots through a writer that is only valid while the selection is.

use std::sync::Arc;
use std::time::Duration;

use skyglass_api::CachePolicy;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::route::Route;
use crate::source::ServerSource;
use crate::store::{SessionLease, SessionStore, SessionWriter};

// ── SessionPhase ─────────────────────────────────────────────────

/// Session state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Fetching { server: String },
    Ready { server: String },
    /// The backend does not know the selected server.
    NotFound { server: String },
    Failed { server: String, message: String },
}

impl SessionPhase {
    pub fn server(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Fetching { server }
            | Self::Ready { server }
            | Self::NotFound { server }
            | Self::Failed { server, .. } => Some(server),
        }
    }

    /// `true` while the session is fetching or polling.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Fetching { .. } | Self::Ready { .. })
    }

    /// Where the consumer must navigate, if this phase invalidates the selection.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            Self::NotFound { .. } => Some(Route::Root),
            _ => None,
        }
    }
}

/// Phase tagged with the session it belongs to.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    /// Store epoch of the owning session; `0` when idle.
    pub(crate) session: u64,
    pub phase: SessionPhase,
}

type PhaseSender = Arc<watch::Sender<SessionStatus>>;

// ── SessionController ────────────────────────────────────────────

/// Orchestrates the per-session fetch loop for the selected server.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. At most one session is
/// active; selecting another server or detaching ends it and resets the
/// [`SessionStore`] before anything else can be written.
pub struct SessionController<S: ServerSource> {
    inner: Arc<ControllerInner<S>>,
}

impl<S: ServerSource> Clone for SessionController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<S: ServerSource> {
    source: Arc<S>,
    store: Arc<SessionStore>,
    poll_interval: Duration,
    phase: PhaseSender,
    active: Mutex<Option<ActiveSession>>,
    cancel: CancellationToken,
}

struct ActiveSession {
    lease: SessionLease,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl<S: ServerSource> SessionController<S> {
    /// Create a controller writing into `store`. Nothing is fetched until
    /// [`select()`](Self::select) is called.
    pub fn new(source: Arc<S>, store: Arc<SessionStore>, poll_interval: Duration) -> Self {
        let (phase, _) = watch::channel(SessionStatus {
            session: 0,
            phase: SessionPhase::Idle,
        });
        Self {
            inner: Arc::new(ControllerInner {
                source,
                store,
                poll_interval,
                phase: Arc::new(phase),
                active: Mutex::new(None),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.inner.store
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.phase.borrow().phase.clone()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SessionStatus> {
        self.inner.phase.subscribe()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Make `server` the selected server.
    ///
    /// Re-selecting the server of a session that is still fetching or
    /// polling does nothing. Otherwise the previous session ends (its store
    /// contents are dropped and its late responses discarded) and a new
    /// session starts in [`SessionPhase::Fetching`].
    pub async fn select(&self, server: &str) {
        let mut active = self.inner.active.lock().await;

        if let Some(current) = active.as_ref() {
            let status = self.inner.phase.borrow().clone();
            if current.lease.server() == server
                && status.session == current.lease.epoch()
                && status.phase.is_active()
            {
                debug!(server, "server already selected");
                return;
            }
        }

        if let Some(previous) = active.take() {
            debug!(server = previous.lease.server(), "superseding session");
            drop(previous.end());
        }

        let lease = self.inner.store.claim(server);
        self.inner.phase.send_replace(SessionStatus {
            session: lease.epoch(),
            phase: SessionPhase::Fetching {
                server: server.to_owned(),
            },
        });

        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(session_task(
            Arc::clone(&self.inner.source),
            lease.writer(),
            server.to_owned(),
            Arc::clone(&self.inner.phase),
            self.inner.poll_interval,
            cancel.clone(),
        ));

        info!(server, "session started");
        *active = Some(ActiveSession {
            lease,
            cancel,
            handle,
        });
    }

    /// End the active session, if any, and return to [`SessionPhase::Idle`].
    ///
    /// The store is empty when this returns.
    pub async fn detach(&self) {
        // Idle is published under the guard: a concurrent `select` lands
        // entirely before this (and is ended here) or entirely after.
        let mut active = self.inner.active.lock().await;
        let previous = active.take();
        self.inner.phase.send_replace(SessionStatus {
            session: 0,
            phase: SessionPhase::Idle,
        });
        let ended = previous.map(|p| (p.lease.server().to_owned(), p.end()));
        drop(active);

        if let Some((server, handle)) = ended {
            let _ = handle.await;
            info!(server, "session detached");
        }
    }
}

impl ActiveSession {
    /// Stop the fetch task and release the store. The task observes
    /// cancellation at its next suspension point; its writer is already
    /// dead by then.
    fn end(self) -> JoinHandle<()> {
        self.cancel.cancel();
        drop(self.lease);
        self.handle
    }
}

impl<S: ServerSource> Drop for ControllerInner<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background task ──────────────────────────────────────────────

/// Fetch `server`'s state until cancelled, an error occurs, or (with a zero
/// interval) after the first response.
async fn session_task<S: ServerSource>(
    source: Arc<S>,
    writer: SessionWriter,
    server: String,
    phase: PhaseSender,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    let session = writer.epoch();

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = source.server_state(&server, CachePolicy::NoCache) => result,
        };

        match result {
            Ok(state) => {
                if !writer.publish(state) {
                    debug!(server, "discarding response for superseded session");
                    break;
                }
                set_phase(
                    &phase,
                    session,
                    SessionPhase::Ready {
                        server: server.clone(),
                    },
                );
            }
            Err(e) => {
                writer.clear();
                let next = match CoreError::session(&server, &e) {
                    CoreError::SessionNotFound { server } => {
                        info!(server, "selected server no longer exists");
                        SessionPhase::NotFound { server }
                    }
                    err => {
                        warn!(server, error = %e, "session fetch failed");
                        SessionPhase::Failed {
                            server: server.clone(),
                            message: err.to_string(),
                        }
                    }
                };
                set_phase(&phase, session, next);
                break;
            }
        }

        if poll_interval.is_zero() {
            break;
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(poll_interval) => {}
        }
    }

    debug!(server, session, "session task finished");
}

/// Update the phase only if `session` still owns it.
fn set_phase(phase: &PhaseSender, session: u64, next: SessionPhase) {
    phase.send_if_modified(|status| {
        if status.session != session || status.phase == next {
            return false;
        }
        status.phase = next;
        true
    });
}
