//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::record::FlowKind;

/// Register command arguments. Missing values are asked for interactively.
#[derive(Debug, Args)]
pub struct RegisterCommand {
    /// Phone number (at least 10 characters)
    #[arg(short, long)]
    pub phone: Option<String>,

    /// Your name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Replace an existing registration
    #[arg(short, long)]
    pub force: bool,
}

/// Profile commands.
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Show the registered user
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Forget the registered user
    Clear,
}

/// Options shared by every attendance action.
#[derive(Debug, Clone, Default, Args)]
pub struct SessionArgs {
    /// Simulate a denied location permission
    #[arg(long)]
    pub deny_location: bool,

    /// Dismiss the confirmation without waiting for Enter
    #[arg(short, long)]
    pub yes: bool,
}

/// Office attendance.
#[derive(Debug, Subcommand)]
pub enum OfficeCommand {
    /// Check in at the office
    #[command(name = "checkin")]
    CheckIn(SessionArgs),

    /// Check out of the office
    #[command(name = "checkout")]
    CheckOut(SessionArgs),
}

/// Meeting attendance arguments.
#[derive(Debug, Clone, Default, Args)]
pub struct MeetingArgs {
    /// Meeting notes or information; asked for when omitted
    #[arg(long)]
    pub notes: Option<String>,

    /// Shared session options.
    #[command(flatten)]
    pub session: SessionArgs,
}

/// Meeting attendance.
#[derive(Debug, Subcommand)]
pub enum MeetingCommand {
    /// Record arrival at a meeting
    #[command(name = "checkin")]
    CheckIn(MeetingArgs),

    /// Record departure from a meeting
    #[command(name = "checkout")]
    CheckOut(MeetingArgs),
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

impl OfficeCommand {
    /// The flow this command runs.
    #[must_use]
    pub fn kind(&self) -> FlowKind {
        match self {
            Self::CheckIn(_) => FlowKind::OfficeCheckIn,
            Self::CheckOut(_) => FlowKind::OfficeCheckOut,
        }
    }

    /// Session options.
    #[must_use]
    pub fn args(&self) -> &SessionArgs {
        match self {
            Self::CheckIn(args) | Self::CheckOut(args) => args,
        }
    }
}

impl MeetingCommand {
    /// The flow this command runs.
    #[must_use]
    pub fn kind(&self) -> FlowKind {
        match self {
            Self::CheckIn(_) => FlowKind::MeetingCheckIn,
            Self::CheckOut(_) => FlowKind::MeetingCheckOut,
        }
    }

    /// Meeting options.
    #[must_use]
    pub fn args(&self) -> &MeetingArgs {
        match self {
            Self::CheckIn(args) | Self::CheckOut(args) => args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_office_kinds() {
        assert_eq!(
            OfficeCommand::CheckIn(SessionArgs::default()).kind(),
            FlowKind::OfficeCheckIn
        );
        assert_eq!(
            OfficeCommand::CheckOut(SessionArgs::default()).kind(),
            FlowKind::OfficeCheckOut
        );
    }

    #[test]
    fn test_meeting_kinds() {
        assert_eq!(
            MeetingCommand::CheckIn(MeetingArgs::default()).kind(),
            FlowKind::MeetingCheckIn
        );
        assert_eq!(
            MeetingCommand::CheckOut(MeetingArgs::default()).kind(),
            FlowKind::MeetingCheckOut
        );
    }

    #[test]
    fn test_args_accessors() {
        let cmd = OfficeCommand::CheckOut(SessionArgs {
            deny_location: true,
            yes: false,
        });
        assert!(cmd.args().deny_location);

        let cmd = MeetingCommand::CheckIn(MeetingArgs {
            notes: Some("Standup".to_string()),
            session: SessionArgs::default(),
        });
        assert_eq!(cmd.args().notes.as_deref(), Some("Standup"));
    }
}
