//! Core attendance types for rollcall.
//!
//! This module defines the values produced by a completed attendance session:
//! which flow it belonged to, when the user confirmed it, and where.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which of the four attendance contexts a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// Arriving at the office.
    OfficeCheckIn,
    /// Leaving the office.
    OfficeCheckOut,
    /// Arriving at a meeting.
    MeetingCheckIn,
    /// Leaving a meeting.
    MeetingCheckOut,
}

impl FlowKind {
    /// All flow kinds, in menu order.
    pub const ALL: [Self; 4] = [
        Self::OfficeCheckIn,
        Self::OfficeCheckOut,
        Self::MeetingCheckIn,
        Self::MeetingCheckOut,
    ];

    /// Whether this flow happens in a meeting context.
    #[must_use]
    pub const fn is_meeting(self) -> bool {
        matches!(self, Self::MeetingCheckIn | Self::MeetingCheckOut)
    }

    /// Whether this flow records an arrival.
    #[must_use]
    pub const fn is_check_in(self) -> bool {
        matches!(self, Self::OfficeCheckIn | Self::MeetingCheckIn)
    }

    /// Human label for the context ("Office" or "Meeting").
    #[must_use]
    pub const fn context_label(self) -> &'static str {
        if self.is_meeting() {
            "Meeting"
        } else {
            "Office"
        }
    }

    /// Human label for the action ("Check In" or "Check Out").
    #[must_use]
    pub const fn action_label(self) -> &'static str {
        if self.is_check_in() {
            "Check In"
        } else {
            "Check Out"
        }
    }
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OfficeCheckIn => write!(f, "office_check_in"),
            Self::OfficeCheckOut => write!(f, "office_check_out"),
            Self::MeetingCheckIn => write!(f, "meeting_check_in"),
            Self::MeetingCheckOut => write!(f, "meeting_check_out"),
        }
    }
}

/// A device location fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Create a new coordinate pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lat: {:.4}, Long: {:.4}", self.latitude, self.longitude)
    }
}

/// A completed attendance event.
///
/// Records are only built by a session on its way to `Confirmed` and are
/// immutable afterwards, so the fields are exposed through accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    kind: FlowKind,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl AttendanceRecord {
    pub(crate) fn new(
        kind: FlowKind,
        timestamp: DateTime<Utc>,
        location: Option<Coordinates>,
        notes: Option<String>,
    ) -> Self {
        Self {
            kind,
            timestamp,
            location,
            notes,
        }
    }

    /// The flow this record belongs to.
    #[must_use]
    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    /// When the user confirmed the action.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Where the device was, if a fix was available.
    #[must_use]
    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    /// Meeting notes, if any were supplied.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// Acknowledgement returned by a recorder for an accepted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Reference assigned by the recorder.
    pub reference: String,
    /// When the recorder accepted the record.
    pub received_at: DateTime<Utc>,
}

impl Ack {
    /// Create an acknowledgement stamped with the current time.
    #[must_use]
    pub fn now(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            received_at: Utc::now(),
        }
    }
}
