//! Error types for rollcall.
//!
//! This module defines the crate-wide error type. Errors that belong to a
//! single layer (session transitions, location fixes, recording) live next to
//! that layer and convert into [`Error`] where they cross into the CLI.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionError;

/// The main error type for rollcall operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored profile could not be decoded.
    #[error("stored profile under '{key}' is corrupt: {message}")]
    CorruptProfile {
        /// Storage key the value was read from.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Attendance Errors ===
    /// User input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A session transition was refused.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// No profile has been registered yet.
    #[error("no registered user; run `rollcall register` first")]
    NotRegistered,

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// User input that was rejected before it reached a session or the store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Meeting notes were empty or whitespace.
    #[error("Please enter meeting notes or information")]
    EmptyNotes,

    /// Phone number shorter than 10 characters after trimming.
    #[error("Please enter a valid phone number")]
    InvalidPhone,

    /// Name shorter than 2 characters after trimming.
    #[error("Please enter your name")]
    InvalidName,
}

/// A specialized Result type for rollcall operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a corrupt profile error.
    #[must_use]
    pub fn corrupt_profile(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptProfile {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Check if this error was caused by user input.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Session(SessionError::Validation(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_registered_display() {
        let err = Error::NotRegistered;
        assert!(err.to_string().contains("rollcall register"));
        assert!(!err.is_validation_error());
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let err: Error = ValidationError::EmptyNotes.into();
        assert!(err.is_validation_error());
        assert_eq!(err.to_string(), ValidationError::EmptyNotes.to_string());
    }

    #[test]
    fn test_session_validation_counts_as_validation() {
        let err: Error = SessionError::Validation(ValidationError::EmptyNotes).into();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::InvalidPhone.to_string(),
            "Please enter a valid phone number"
        );
        assert_eq!(ValidationError::InvalidName.to_string(), "Please enter your name");
    }

    #[test]
    fn test_session_error_conversion() {
        let err: Error = SessionError::AlreadyInProgress.into();
        assert!(matches!(err, Error::Session(SessionError::AlreadyInProgress)));
        assert!(!err.is_validation_error());
    }

    #[test]
    fn test_corrupt_profile_display() {
        let err = Error::corrupt_profile("@key", "expected value");
        let msg = err.to_string();
        assert!(msg.contains("@key"));
        assert!(msg.contains("expected value"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "latitude out of range".to_string(),
        };
        assert!(err.to_string().contains("latitude out of range"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
