//! The registered user and the registration wizard.
//!
//! A profile is written once at registration and read at startup. It is the
//! only thing rollcall persists.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Storage key the profile lives under.
pub const PROFILE_KEY: &str = "@attendance_app_user_data";

/// Minimum phone number length after trimming.
pub const MIN_PHONE_LEN: usize = 10;

/// Minimum name length after trimming.
pub const MIN_NAME_LEN: usize = 2;

/// The registered user.
///
/// Stored as JSON with camelCase keys (`{"phoneNumber": .., "name": ..}`).
/// Stored values are validated again when read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredProfile")]
pub struct UserProfile {
    phone_number: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProfile {
    phone_number: String,
    name: String,
}

impl TryFrom<StoredProfile> for UserProfile {
    type Error = ValidationError;

    fn try_from(stored: StoredProfile) -> std::result::Result<Self, Self::Error> {
        Self::new(&stored.phone_number, &stored.name)
    }
}

impl UserProfile {
    /// Validate and build a profile. Both values are stored trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPhone`] or
    /// [`ValidationError::InvalidName`] when a value is too short.
    pub fn new(phone_number: &str, name: &str) -> std::result::Result<Self, ValidationError> {
        Ok(Self {
            phone_number: validate_phone(phone_number)?,
            name: validate_name(name)?,
        })
    }

    /// The registered phone number.
    #[must_use]
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    /// The registered display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn validate_phone(phone_number: &str) -> std::result::Result<String, ValidationError> {
    let trimmed = phone_number.trim();
    if trimmed.chars().count() < MIN_PHONE_LEN {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(trimmed.to_string())
}

fn validate_name(name: &str) -> std::result::Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::InvalidName);
    }
    Ok(trimmed.to_string())
}

/// Where the profile is kept.
pub trait ProfileStore {
    /// Read the stored profile, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails or the value is corrupt.
    fn get(&self) -> Result<Option<UserProfile>>;

    /// Store `profile`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn set(&self, profile: &UserProfile) -> Result<()>;

    /// Remove the stored profile. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn clear(&self) -> Result<bool>;
}

/// Which question the registration wizard is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStep {
    /// Asking for the phone number.
    Phone,
    /// Asking for the name.
    Name,
}

impl RegistrationStep {
    /// Prompt shown for this step.
    #[must_use]
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Phone => "Please register with your phone number to continue",
            Self::Name => "Tell us your name to complete registration",
        }
    }
}

/// Two-step registration: phone number, then name.
#[derive(Debug, Clone)]
pub struct Registration {
    step: RegistrationStep,
    phone_number: Option<String>,
    error: Option<ValidationError>,
}

impl Default for Registration {
    fn default() -> Self {
        Self::new()
    }
}

impl Registration {
    /// Start at the phone step.
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: RegistrationStep::Phone,
            phone_number: None,
            error: None,
        }
    }

    /// Current step.
    #[must_use]
    pub fn step(&self) -> RegistrationStep {
        self.step
    }

    /// The last rejected input, if the user hasn't fixed it yet.
    #[must_use]
    pub fn error(&self) -> Option<ValidationError> {
        self.error
    }

    /// Accept the phone number and move to the name step.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPhone`] and stays on the phone step
    /// if the number is too short. Calling this on the name step replaces the
    /// remembered number without moving.
    pub fn submit_phone(&mut self, phone_number: &str) -> std::result::Result<(), ValidationError> {
        match validate_phone(phone_number) {
            Ok(phone) => {
                self.phone_number = Some(phone);
                self.error = None;
                self.step = RegistrationStep::Name;
                Ok(())
            }
            Err(err) => {
                self.error = Some(err);
                Err(err)
            }
        }
    }

    /// Accept the name and finish.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidName`] for a short name, or
    /// [`ValidationError::InvalidPhone`] if no phone number was accepted yet.
    pub fn submit_name(&mut self, name: &str) -> std::result::Result<UserProfile, ValidationError> {
        let result = match (&self.step, &self.phone_number) {
            (RegistrationStep::Name, Some(phone)) => {
                validate_name(name).map(|name| UserProfile {
                    phone_number: phone.clone(),
                    name,
                })
            }
            _ => Err(ValidationError::InvalidPhone),
        };
        self.error = result.as_ref().err().copied();
        result
    }

    /// Go back to the phone step. The entered number is kept for editing.
    pub fn back(&mut self) {
        self.step = RegistrationStep::Phone;
        self.error = None;
    }

    /// The number accepted at the phone step.
    #[must_use]
    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        value: RefCell<Option<String>>,
    }

    impl ProfileStore for MemoryStore {
        fn get(&self) -> Result<Option<UserProfile>> {
            self.value
                .borrow()
                .as_deref()
                .map(serde_json::from_str::<UserProfile>)
                .transpose()
                .map_err(crate::Error::from)
        }

        fn set(&self, profile: &UserProfile) -> Result<()> {
            *self.value.borrow_mut() = Some(serde_json::to_string(profile)?);
            Ok(())
        }

        fn clear(&self) -> Result<bool> {
            Ok(self.value.borrow_mut().take().is_some())
        }
    }

    #[test]
    fn test_profile_trims_values() {
        let profile = UserProfile::new("  5551234567 ", " Ada ").unwrap();
        assert_eq!(profile.phone_number(), "5551234567");
        assert_eq!(profile.name(), "Ada");
    }

    #[test]
    fn test_short_phone_rejected() {
        assert_eq!(
            UserProfile::new("555123456", "Ada"),
            Err(ValidationError::InvalidPhone)
        );
        assert_eq!(
            UserProfile::new("   555123456   ", "Ada"),
            Err(ValidationError::InvalidPhone)
        );
    }

    #[test]
    fn test_short_name_rejected() {
        assert_eq!(
            UserProfile::new("5551234567", " A "),
            Err(ValidationError::InvalidName)
        );
    }

    #[test]
    fn test_profile_json_shape() {
        let profile = UserProfile::new("5551234567", "Ada").unwrap();
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, r#"{"phoneNumber":"5551234567","name":"Ada"}"#);
    }

    #[test]
    fn test_stored_profile_is_validated() {
        let short_phone = serde_json::from_str::<UserProfile>(r#"{"phoneNumber":"1","name":"Ada"}"#);
        assert!(short_phone
            .unwrap_err()
            .to_string()
            .contains("valid phone number"));

        let empty_name =
            serde_json::from_str::<UserProfile>(r#"{"phoneNumber":"5551234567","name":""}"#);
        assert!(empty_name.is_err());

        let padded =
            serde_json::from_str::<UserProfile>(r#"{"phoneNumber":" 5551234567 ","name":"Ada"}"#)
                .unwrap();
        assert_eq!(padded.phone_number(), "5551234567");
    }

    #[test]
    fn test_registration_happy_path() {
        let mut registration = Registration::new();
        assert_eq!(registration.step(), RegistrationStep::Phone);

        registration.submit_phone("5551234567").unwrap();
        assert_eq!(registration.step(), RegistrationStep::Name);

        let profile = registration.submit_name("Grace").unwrap();
        assert_eq!(profile.phone_number(), "5551234567");
        assert_eq!(profile.name(), "Grace");
    }

    #[test]
    fn test_registration_bad_phone_stays_on_phone_step() {
        let mut registration = Registration::new();
        assert!(registration.submit_phone("123").is_err());
        assert_eq!(registration.step(), RegistrationStep::Phone);
        assert_eq!(registration.error(), Some(ValidationError::InvalidPhone));

        registration.submit_phone("1234567890").unwrap();
        assert!(registration.error().is_none());
    }

    #[test]
    fn test_registration_name_before_phone() {
        let mut registration = Registration::new();
        assert_eq!(
            registration.submit_name("Grace"),
            Err(ValidationError::InvalidPhone)
        );
    }

    #[test]
    fn test_registration_back_keeps_number() {
        let mut registration = Registration::new();
        registration.submit_phone("5551234567").unwrap();
        assert!(registration.submit_name("G").is_err());

        registration.back();
        assert_eq!(registration.step(), RegistrationStep::Phone);
        assert!(registration.error().is_none());
        assert_eq!(registration.phone_number(), Some("5551234567"));
        assert!(registration.submit_name("Grace").is_err());
    }

    #[test]
    fn test_step_prompts() {
        assert!(RegistrationStep::Phone.prompt().contains("phone number"));
        assert!(RegistrationStep::Name.prompt().contains("name"));
    }

    #[test]
    fn test_store_contract() {
        let store = MemoryStore::default();
        assert!(store.get().unwrap().is_none());

        let profile = UserProfile::new("5551234567", "Ada").unwrap();
        store.set(&profile).unwrap();
        assert_eq!(store.get().unwrap(), Some(profile));

        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
    }
}
