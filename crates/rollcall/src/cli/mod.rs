//! Command-line interface for rollcall.
//!
//! This module provides the CLI structure for the `rollcall` binary. Each
//! attendance subcommand drives one session to completion.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, MeetingArgs, MeetingCommand, OfficeCommand, ProfileCommand, RegisterCommand,
    SessionArgs,
};

use crate::logging::Verbosity;

/// rollcall - Office and meeting attendance
///
/// Check in and out of the office or a meeting. Each action records the
/// time and, when available, your location.
#[derive(Debug, Parser)]
#[command(name = "rollcall")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register your phone number and name
    Register(RegisterCommand),

    /// Show the main menu
    Menu,

    /// Show or clear the registered user
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Office check-in and check-out
    #[command(subcommand)]
    Office(OfficeCommand),

    /// Meeting check-in and check-out
    #[command(subcommand)]
    Meeting(MeetingCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

/// Turn an answer to the notes prompt into the notes to submit.
///
/// `None` means input is closed and the user can no longer answer. A blank
/// answer reuses notes kept from a failed attempt.
#[must_use]
pub fn notes_answer(entered: Option<String>, draft: Option<String>) -> Option<String> {
    let entered = entered?;
    if entered.trim().is_empty() {
        Some(draft.unwrap_or(entered))
    } else {
        Some(entered)
    }
}
