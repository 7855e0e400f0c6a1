//! Confirmation overlay payloads.

use serde::Serialize;

use crate::record::{AttendanceRecord, FlowKind};

/// Whether a confirmation reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationKind {
    /// The action completed.
    Success,
    /// The action failed.
    Error,
}

/// What the confirmation surface shows to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    /// Headline.
    pub message: String,
    /// Optional detail line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_message: Option<String>,
    /// Success or error styling.
    pub kind: ConfirmationKind,
}

impl Confirmation {
    /// Confirmation for a recorded attendance event.
    #[must_use]
    pub fn for_record(record: &AttendanceRecord) -> Self {
        let kind = record.kind();
        if kind.is_meeting() {
            let movement = if kind.is_check_in() {
                "arrival at"
            } else {
                "departure from"
            };
            Self {
                message: format!("Meeting {} Successful", kind.action_label()),
                sub_message: Some(format!("Your {movement} the meeting has been recorded.")),
                kind: ConfirmationKind::Success,
            }
        } else {
            let verb = if kind.is_check_in() {
                "checked in"
            } else {
                "checked out"
            };
            Self {
                message: format!("You have successfully {verb}!"),
                sub_message: None,
                kind: ConfirmationKind::Success,
            }
        }
    }

    /// Confirmation for a failed submission.
    #[must_use]
    pub fn for_failure(kind: FlowKind, reason: &str) -> Self {
        Self {
            message: format!("{} {} Failed", kind.context_label(), kind.action_label()),
            sub_message: Some(reason.to_string()),
            kind: ConfirmationKind::Error,
        }
    }

    /// Label of the dismiss button.
    #[must_use]
    pub fn button_label(&self) -> &'static str {
        match self.kind {
            ConfirmationKind::Success => "OK",
            ConfirmationKind::Error => "Close",
        }
    }
}

impl std::fmt::Display for Confirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(sub) = &self.sub_message {
            write!(f, "\n{sub}")?;
        }
        Ok(())
    }
}
