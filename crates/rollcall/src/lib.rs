//! `rollcall` - office and meeting attendance check-in/check-out
//!
//! The heart of the crate is [`session`]: a state machine for one check-in or
//! check-out attempt and an async controller that drives it against a
//! location provider, an attendance recorder and a navigator. Around it sit
//! the registered user's profile, its `SQLite` store, configuration and the
//! CLI definitions.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod location;
pub mod logging;
pub mod navigation;
pub mod profile;
pub mod record;
pub mod recorder;
pub mod session;
pub mod storage;

pub use config::Config;
pub use confirmation::{Confirmation, ConfirmationKind};
pub use error::{Error, Result, ValidationError};
pub use location::{LocationError, LocationProvider, SimulatedLocationProvider};
pub use logging::init_logging;
pub use navigation::{ConsoleNavigator, Destination, Navigator};
pub use profile::{ProfileStore, Registration, RegistrationStep, UserProfile};
pub use record::{Ack, AttendanceRecord, Coordinates, FlowKind};
pub use recorder::{AttendanceRecorder, RecordingError, SimulatedRecorder};
pub use session::{
    AttendanceController, FlowConfig, Session, SessionError, SessionHandle, SessionSettings,
    SessionState,
};
pub use storage::Storage;
