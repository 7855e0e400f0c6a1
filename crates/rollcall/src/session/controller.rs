//! Async driver for an attendance session.
//!
//! The controller owns a [`Session`] and the collaborators it talks to. Every
//! transition happens under one lock that is never held across an await, so
//! racing events (a late location fix against a cancel, a user dismissal
//! against the auto-dismiss timer) are serialised and the loser is a no-op.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{FlowConfig, Result, Session, SessionHandle, SessionState};
use crate::config::SessionConfig;
use crate::confirmation::Confirmation;
use crate::location::{LocationError, LocationProvider};
use crate::navigation::{Destination, Navigator};
use crate::record::Coordinates;
use crate::recorder::{AttendanceRecorder, RecordingError};

/// Reason recorded when the recorder does not answer in time.
pub const SUBMIT_TIMEOUT_REASON: &str = "timeout";

/// Time limits applied to collaborator calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Upper bound on waiting for a location fix.
    pub location_timeout: Duration,
    /// Upper bound on waiting for the recorder.
    pub submit_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            location_timeout: Duration::from_secs(10),
            submit_timeout: Duration::from_secs(15),
        }
    }
}

impl From<&SessionConfig> for SessionSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            location_timeout: Duration::from_millis(config.location_timeout_ms),
            submit_timeout: Duration::from_millis(config.submit_timeout_ms),
        }
    }
}

struct Inner {
    session: Mutex<Session>,
    state_tx: watch::Sender<SessionState>,
    dismiss_timer: Mutex<Option<(SessionHandle, JoinHandle<()>)>>,
    location: Arc<dyn LocationProvider>,
    recorder: Arc<dyn AttendanceRecorder>,
    navigator: Arc<dyn Navigator>,
    settings: SessionSettings,
}

/// Runs attendance sessions against real or simulated collaborators.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct AttendanceController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AttendanceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttendanceController")
            .field("state", &self.state())
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

impl AttendanceController {
    /// Create a controller with an idle session.
    #[must_use]
    pub fn new(
        location: Arc<dyn LocationProvider>,
        recorder: Arc<dyn AttendanceRecorder>,
        navigator: Arc<dyn Navigator>,
        settings: SessionSettings,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(Session::new()),
                state_tx,
                dismiss_timer: Mutex::new(None),
                location,
                recorder,
                navigator,
                settings,
            }),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session().state().clone()
    }

    /// The confirmation to display, if any.
    #[must_use]
    pub fn confirmation(&self) -> Option<Confirmation> {
        self.session().confirmation()
    }

    /// Why the current attempt has no fresh location, if it failed.
    #[must_use]
    pub fn location_issue(&self) -> Option<LocationError> {
        self.session().location_issue()
    }

    /// Notes kept from a failed submission, for prefilling.
    #[must_use]
    pub fn draft_notes(&self) -> Option<String> {
        self.session().draft_notes().map(str::to_string)
    }

    /// Number of records confirmed through this controller.
    #[must_use]
    pub fn records_emitted(&self) -> u64 {
        self.session().records_emitted()
    }

    /// Watch state changes, e.g. to re-render.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    /// Begin a new attempt.
    ///
    /// # Errors
    ///
    /// Returns [`super::SessionError::AlreadyInProgress`] if an attempt is
    /// still running.
    pub fn start(&self, flow: FlowConfig) -> Result<SessionHandle> {
        let handle = self.with_session(|session| session.start(flow))?;
        // Starting over a confirmed attempt supersedes its pending auto-dismiss.
        self.disarm_timer();
        info!("Started {} (session {})", flow.kind, handle.generation());
        Ok(handle)
    }

    /// Ask the location provider for a fix and feed the answer to the session.
    ///
    /// Submits straight away for flows that need no notes.
    pub async fn acquire_location(&self, handle: &SessionHandle) -> SessionState {
        if !self.with_session(|session| {
            session.is_current(handle) && matches!(session.state(), SessionState::AcquiringLocation)
        }) {
            return self.state();
        }

        let budget = self.inner.settings.location_timeout;
        let fix = tokio::time::timeout(budget, self.inner.location.request_fix(budget))
            .await
            .unwrap_or(Err(LocationError::Timeout));

        self.provide_location(handle, fix).await
    }

    /// Deliver a location outcome obtained elsewhere.
    ///
    /// Ignored unless the session is still acquiring location for `handle`.
    pub async fn provide_location(
        &self,
        handle: &SessionHandle,
        fix: std::result::Result<Coordinates, LocationError>,
    ) -> SessionState {
        let submitting = self.with_session(|session| {
            session.provide_location(handle, fix)
                && matches!(session.state(), SessionState::Submitting)
        });
        if submitting {
            self.submit(handle).await;
        }
        self.state()
    }

    /// Submit meeting notes and, if they are valid, the record.
    ///
    /// # Errors
    ///
    /// Returns the session's error if the notes were refused; the session is
    /// back in `Idle` for empty notes.
    pub async fn submit_notes(&self, handle: &SessionHandle, text: &str) -> Result<SessionState> {
        self.with_session(|session| session.submit_notes(handle, text))?;
        self.submit(handle).await;
        Ok(self.state())
    }

    /// Acknowledge the confirmation and go home.
    ///
    /// Idempotent; returns `true` only for the call that dismissed.
    pub fn confirm_dismiss(&self, handle: &SessionHandle) -> bool {
        let dismissed = self.dismiss(handle);
        if dismissed {
            self.disarm_timer();
        }
        dismissed
    }

    /// Abandon the attempt and go back. Late collaborator answers are ignored.
    pub fn cancel(&self, handle: &SessionHandle) -> bool {
        let cancelled = self.with_session(|session| session.cancel(handle));
        if cancelled {
            self.disarm_timer();
            self.inner.navigator.navigate(Destination::Back);
        }
        cancelled
    }

    /// Return to `Idle` after a failure.
    ///
    /// # Errors
    ///
    /// Returns the session's error if it has not failed.
    pub fn retry(&self, handle: &SessionHandle) -> Result<()> {
        self.with_session(|session| session.retry(handle))
    }

    /// Run `work` for the attempt `handle`, cancelling it if `signal` fires
    /// first.
    ///
    /// Returns `None` when the attempt was interrupted. `work` is dropped at
    /// its current await point, so a recorder answer still in flight is
    /// ignored.
    pub async fn cancel_on<T, S>(
        &self,
        handle: &SessionHandle,
        work: impl Future<Output = T>,
        signal: S,
    ) -> Option<T>
    where
        S: Future,
    {
        tokio::select! {
            out = work => Some(out),
            _ = signal => {
                debug!("Interrupted session {}", handle.generation());
                self.cancel(handle);
                None
            }
        }
    }

    /// Wait until the session is dismissed or cancelled.
    pub async fn wait_until_finished(&self) -> SessionState {
        let mut rx = self.subscribe();
        let finished = rx
            .wait_for(SessionState::is_terminal)
            .await
            .map(|state| state.clone());
        finished.unwrap_or_else(|_| self.state())
    }

    async fn submit(&self, handle: &SessionHandle) {
        let Some(record) = self.with_session(|session| session.begin_submission(handle)) else {
            return;
        };

        debug!("Submitting {}", record.kind());
        let outcome = tokio::time::timeout(
            self.inner.settings.submit_timeout,
            self.inner.recorder.record(&record),
        )
        .await
        .unwrap_or_else(|_| Err(RecordingError::new(SUBMIT_TIMEOUT_REASON)));

        let auto_dismiss = self.with_session(|session| {
            let applied = session.complete_submission(handle, outcome);
            if applied && matches!(session.state(), SessionState::Confirmed(_)) {
                session.flow().and_then(|flow| flow.auto_dismiss)
            } else {
                None
            }
        });

        if let Some(delay) = auto_dismiss {
            self.arm_timer(*handle, delay);
        }
    }

    fn dismiss(&self, handle: &SessionHandle) -> bool {
        let dismissed = self.with_session(|session| session.confirm_dismiss(handle));
        if dismissed {
            self.inner.navigator.navigate(Destination::Home);
        }
        dismissed
    }

    fn arm_timer(&self, handle: SessionHandle, delay: Duration) {
        debug!("Auto-dismiss in {delay:?}");
        let controller = self.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if controller.dismiss(&handle) {
                controller.release_timer(&handle);
            }
        });
        if let Some((_, previous)) = self.timer_slot().replace((handle, task)) {
            previous.abort();
        }
    }

    fn disarm_timer(&self) {
        if let Some((_, task)) = self.timer_slot().take() {
            task.abort();
        }
    }

    /// Forget the timer armed for `handle`, leaving a newer attempt's timer alone.
    fn release_timer(&self, handle: &SessionHandle) {
        let mut slot = self.timer_slot();
        if slot.as_ref().is_some_and(|(armed, _)| armed == handle) {
            slot.take();
        }
    }

    /// Apply `f` to the session under the lock and publish the resulting state.
    fn with_session<T>(&self, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut session = self.session();
        let out = f(&mut session);
        self.inner.state_tx.send_if_modified(|published| {
            if *published == *session.state() {
                false
            } else {
                *published = session.state().clone();
                true
            }
        });
        out
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn timer_slot(&self) -> MutexGuard<'_, Option<(SessionHandle, JoinHandle<()>)>> {
        self.inner
            .dismiss_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
