//! The attendance session state machine.
//!
//! A [`Session`] tracks one check-in or check-out attempt from the moment the
//! user presses the button until the confirmation is dismissed or the attempt
//! is cancelled. It performs no I/O: location fixes, recorder results and
//! timer expiry are delivered to it as events, and each event is checked
//! against the current state and the [`SessionHandle`] it carries. Events that
//! arrive for a previous attempt, or in a state that no longer expects them,
//! are ignored.
//!
//! ```text
//! Idle -> AcquiringLocation -> [ValidatingInput] -> Submitting -> Confirmed -> Dismissed
//!                                     |                 |
//!                                     v                 v
//!                                   Idle             Failed -> Idle (retry)
//! ```
//!
//! Any non-terminal in-progress state can be cancelled.
//!
//! [`controller::AttendanceController`] binds a session to the async
//! collaborators.

pub mod controller;

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::confirmation::Confirmation;
use crate::error::ValidationError;
use crate::location::LocationError;
use crate::record::{Ack, AttendanceRecord, Coordinates, FlowKind};
use crate::recorder::RecordingError;

pub use controller::{AttendanceController, SessionSettings};

/// How long office confirmations stay up before dismissing themselves.
pub const DEFAULT_AUTO_DISMISS: Duration = Duration::from_secs(2);

/// Reason recorded when a flow that requires location cannot get one.
pub const LOCATION_UNAVAILABLE: &str = "location unavailable";

/// Errors returned by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A session is already running and has not finished.
    #[error("an attendance session is already in progress")]
    AlreadyInProgress,

    /// The operation does not apply in the current state.
    #[error("cannot {operation} while the session is {state}")]
    InvalidState {
        /// The refused operation.
        operation: &'static str,
        /// The state the session was in.
        state: &'static str,
    },

    /// The handle belongs to an earlier session.
    #[error("session handle is stale")]
    StaleHandle,

    /// The user's input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Per-flow behaviour of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowConfig {
    /// Which attendance context this is.
    pub kind: FlowKind,
    /// Whether the user must enter notes before submitting.
    pub notes_required: bool,
    /// Dismiss the confirmation automatically after this delay.
    /// `None` waits for the user.
    pub auto_dismiss: Option<Duration>,
    /// Fail the attempt instead of recording without a location.
    pub location_required: bool,
}

impl FlowConfig {
    /// A flow with manual dismissal and best-effort location.
    #[must_use]
    pub const fn new(kind: FlowKind, notes_required: bool) -> Self {
        Self {
            kind,
            notes_required,
            auto_dismiss: None,
            location_required: false,
        }
    }

    /// The default configuration for `kind`: office flows auto-dismiss and
    /// need no notes, meeting flows require notes and manual dismissal.
    #[must_use]
    pub const fn for_kind(kind: FlowKind) -> Self {
        if kind.is_meeting() {
            Self::new(kind, true)
        } else {
            Self::new(kind, false).with_auto_dismiss(Some(DEFAULT_AUTO_DISMISS))
        }
    }

    /// Set the auto-dismiss delay.
    #[must_use]
    pub const fn with_auto_dismiss(mut self, delay: Option<Duration>) -> Self {
        self.auto_dismiss = delay;
        self
    }

    /// Set whether a missing location fails the attempt.
    #[must_use]
    pub const fn with_location_required(mut self, required: bool) -> Self {
        self.location_required = required;
        self
    }
}

/// Identifies one attempt. Issued by [`Session::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    generation: u64,
    kind: FlowKind,
}

impl SessionHandle {
    /// The flow this attempt belongs to.
    #[must_use]
    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    /// Monotonic attempt number within the owning session.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Where a session currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No action started.
    Idle,
    /// Waiting for a location fix.
    AcquiringLocation,
    /// Waiting for the user's notes.
    ValidatingInput,
    /// The record is with the recorder.
    Submitting,
    /// The record was accepted.
    Confirmed(AttendanceRecord),
    /// The recorder rejected the attempt; retry returns to `Idle`.
    Failed {
        /// Why the attempt failed.
        reason: String,
    },
    /// The confirmation was acknowledged.
    Dismissed,
    /// The attempt was abandoned before completing.
    Cancelled,
}

impl SessionState {
    /// Short lowercase name, used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AcquiringLocation => "acquiring location",
            Self::ValidatingInput => "validating input",
            Self::Submitting => "submitting",
            Self::Confirmed(_) => "confirmed",
            Self::Failed { .. } => "failed",
            Self::Dismissed => "dismissed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the session has ended for good.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dismissed | Self::Cancelled)
    }

    /// Whether a new attempt may begin from here.
    #[must_use]
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            Self::Idle | Self::Confirmed(_) | Self::Dismissed | Self::Cancelled
        )
    }

    /// Whether an attempt is underway and may be cancelled.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            Self::AcquiringLocation | Self::ValidatingInput | Self::Submitting | Self::Failed { .. }
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed { reason } => write!(f, "failed ({reason})"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Location and notes kept from a failed submission.
#[derive(Debug, Clone, PartialEq)]
struct Draft {
    kind: FlowKind,
    location: Option<Coordinates>,
    notes: Option<String>,
}

impl Draft {
    fn from_record(record: &AttendanceRecord) -> Self {
        Self {
            kind: record.kind(),
            location: record.location(),
            notes: record.notes().map(str::to_string),
        }
    }
}

/// One attendance session.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    generation: u64,
    flow: Option<FlowConfig>,
    confirmed_at: DateTime<Utc>,
    location: Option<Coordinates>,
    location_issue: Option<LocationError>,
    validation_error: Option<ValidationError>,
    pending: Option<AttendanceRecord>,
    in_flight: Option<AttendanceRecord>,
    draft: Option<Draft>,
    records_emitted: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an idle session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
            flow: None,
            confirmed_at: Utc::now(),
            location: None,
            location_issue: None,
            validation_error: None,
            pending: None,
            in_flight: None,
            draft: None,
            records_emitted: 0,
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The flow of the current or most recent attempt.
    #[must_use]
    pub fn flow(&self) -> Option<&FlowConfig> {
        self.flow.as_ref()
    }

    /// The location resolved for the current attempt.
    #[must_use]
    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    /// Why the current attempt has no fresh location, if it failed.
    #[must_use]
    pub fn location_issue(&self) -> Option<LocationError> {
        self.location_issue
    }

    /// The validation error from the last notes submission.
    #[must_use]
    pub fn validation_error(&self) -> Option<ValidationError> {
        self.validation_error
    }

    /// Notes kept from a failed submission of the same flow, for prefilling.
    #[must_use]
    pub fn draft_notes(&self) -> Option<&str> {
        self.draft.as_ref().and_then(|d| d.notes.as_deref())
    }

    /// Number of records this session has had confirmed.
    #[must_use]
    pub fn records_emitted(&self) -> u64 {
        self.records_emitted
    }

    /// Whether `handle` refers to the current attempt.
    #[must_use]
    pub fn is_current(&self, handle: &SessionHandle) -> bool {
        handle.generation == self.generation && self.generation != 0
    }

    /// The confirmation surface for the current state, if any.
    #[must_use]
    pub fn confirmation(&self) -> Option<Confirmation> {
        match &self.state {
            SessionState::Confirmed(record) => Some(Confirmation::for_record(record)),
            SessionState::Failed { reason } => self
                .flow
                .map(|flow| Confirmation::for_failure(flow.kind, reason)),
            _ => None,
        }
    }

    /// Begin a new attempt.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyInProgress`] unless the session is idle,
    /// confirmed, dismissed or cancelled.
    pub fn start(&mut self, flow: FlowConfig) -> Result<SessionHandle> {
        if !self.state.can_start() {
            return Err(SessionError::AlreadyInProgress);
        }

        if self.draft.as_ref().is_some_and(|d| d.kind != flow.kind) {
            debug!("Discarding draft from a different flow");
            self.draft = None;
        }

        self.generation += 1;
        self.flow = Some(flow);
        self.confirmed_at = Utc::now();
        self.location = None;
        self.location_issue = None;
        self.validation_error = None;
        self.pending = None;
        self.in_flight = None;
        self.transition(SessionState::AcquiringLocation);

        Ok(SessionHandle {
            generation: self.generation,
            kind: flow.kind,
        })
    }

    /// Deliver the outcome of a location request.
    ///
    /// Returns `false` if the event was ignored.
    pub fn provide_location(
        &mut self,
        handle: &SessionHandle,
        result: std::result::Result<Coordinates, LocationError>,
    ) -> bool {
        if !self.accepts(handle, "location", |s| {
            matches!(s, SessionState::AcquiringLocation)
        }) {
            return false;
        }
        let Some(flow) = self.flow else {
            return false;
        };

        match result {
            Ok(coordinates) => self.location = Some(coordinates),
            Err(err) => {
                warn!("Location unavailable for {}: {err}", flow.kind);
                self.location_issue = Some(err);
                self.location = self.draft.as_ref().and_then(|d| d.location);
            }
        }

        if flow.location_required && self.location.is_none() {
            self.transition(SessionState::Failed {
                reason: LOCATION_UNAVAILABLE.to_string(),
            });
        } else if flow.notes_required {
            self.transition(SessionState::ValidatingInput);
        } else {
            self.prepare_record(flow.kind, None);
        }
        true
    }

    /// Submit the user's notes.
    ///
    /// Empty or whitespace-only notes abort the attempt: the session returns
    /// to `Idle` and the error is kept in [`Session::validation_error`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::StaleHandle`] or [`SessionError::InvalidState`]
    /// if the session is not waiting for notes, and
    /// [`SessionError::Validation`] if the notes are empty.
    pub fn submit_notes(&mut self, handle: &SessionHandle, text: &str) -> Result<()> {
        if !self.is_current(handle) {
            return Err(SessionError::StaleHandle);
        }
        if !matches!(self.state, SessionState::ValidatingInput) {
            return Err(SessionError::InvalidState {
                operation: "submit notes",
                state: self.state.name(),
            });
        }
        let Some(flow) = self.flow else {
            return Err(SessionError::InvalidState {
                operation: "submit notes",
                state: self.state.name(),
            });
        };

        let notes = text.trim();
        if notes.is_empty() {
            self.flow = None;
            self.location = None;
            self.location_issue = None;
            self.validation_error = Some(ValidationError::EmptyNotes);
            self.transition(SessionState::Idle);
            return Err(ValidationError::EmptyNotes.into());
        }

        self.confirmed_at = Utc::now();
        self.prepare_record(flow.kind, Some(notes.to_string()));
        Ok(())
    }

    /// Take the record to send to the recorder.
    ///
    /// Yields the record at most once per submission.
    pub fn begin_submission(&mut self, handle: &SessionHandle) -> Option<AttendanceRecord> {
        if !self.is_current(handle) || !matches!(self.state, SessionState::Submitting) {
            return None;
        }
        let record = self.pending.take()?;
        self.in_flight = Some(record.clone());
        Some(record)
    }

    /// Deliver the recorder's answer.
    ///
    /// Returns `false` if the event was ignored.
    pub fn complete_submission(
        &mut self,
        handle: &SessionHandle,
        result: std::result::Result<Ack, RecordingError>,
    ) -> bool {
        if !self.accepts(handle, "submission result", |s| {
            matches!(s, SessionState::Submitting)
        }) {
            return false;
        }
        let Some(record) = self.in_flight.take().or_else(|| self.pending.take()) else {
            return false;
        };

        match result {
            Ok(ack) => {
                info!("{} confirmed ({})", record.kind(), ack.reference);
                self.records_emitted += 1;
                self.draft = None;
                self.transition(SessionState::Confirmed(record));
            }
            Err(err) => {
                warn!("{} failed: {err}", record.kind());
                self.draft = Some(Draft::from_record(&record));
                self.transition(SessionState::Failed {
                    reason: err.message().to_string(),
                });
            }
        }
        true
    }

    /// Acknowledge the confirmation.
    ///
    /// Safe to call more than once; returns `true` only for the call that
    /// performed the transition.
    pub fn confirm_dismiss(&mut self, handle: &SessionHandle) -> bool {
        if !self.is_current(handle) || !matches!(self.state, SessionState::Confirmed(_)) {
            return false;
        }
        self.transition(SessionState::Dismissed);
        true
    }

    /// Abandon the current attempt.
    ///
    /// Returns `true` if the session moved to `Cancelled`.
    pub fn cancel(&mut self, handle: &SessionHandle) -> bool {
        if !self.is_current(handle) || !self.state.is_cancellable() {
            return false;
        }
        if matches!(self.state, SessionState::Submitting) && self.in_flight.is_some() {
            warn!("Cancelled while the recorder holds the record; its answer will be ignored");
        }
        self.pending = None;
        self.in_flight = None;
        self.transition(SessionState::Cancelled);
        true
    }

    /// Return to `Idle` after a failure, keeping the draft.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::StaleHandle`] or [`SessionError::InvalidState`]
    /// if the session has not failed.
    pub fn retry(&mut self, handle: &SessionHandle) -> Result<()> {
        if !self.is_current(handle) {
            return Err(SessionError::StaleHandle);
        }
        if !matches!(self.state, SessionState::Failed { .. }) {
            return Err(SessionError::InvalidState {
                operation: "retry",
                state: self.state.name(),
            });
        }
        self.transition(SessionState::Idle);
        Ok(())
    }

    fn prepare_record(&mut self, kind: FlowKind, notes: Option<String>) {
        self.pending = Some(AttendanceRecord::new(
            kind,
            self.confirmed_at,
            self.location,
            notes,
        ));
        self.transition(SessionState::Submitting);
    }

    fn accepts(
        &self,
        handle: &SessionHandle,
        event: &str,
        expected: impl Fn(&SessionState) -> bool,
    ) -> bool {
        if !self.is_current(handle) {
            debug!(
                "Ignoring {event} for stale session {} (current {})",
                handle.generation, self.generation
            );
            return false;
        }
        if !expected(&self.state) {
            debug!("Ignoring {event} while {}", self.state);
            return false;
        }
        true
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            generation = self.generation,
            "Session {} -> {}", self.state, next
        );
        self.state = next;
    }
}
