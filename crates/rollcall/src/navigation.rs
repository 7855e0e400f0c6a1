//! Navigation away from an attendance screen.

use tracing::debug;

/// Where the user is sent once a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The previous screen.
    Back,
    /// The main menu.
    Home,
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Back => write!(f, "back"),
            Self::Home => write!(f, "home"),
        }
    }
}

/// Receives navigation requests from the session controller.
///
/// The controller only navigates after a session is dismissed (home) or
/// cancelled (back).
pub trait Navigator: Send + Sync {
    /// Return to the previous screen.
    fn go_back(&self);

    /// Return to the main menu.
    fn go_home(&self);

    /// Navigate to `destination`.
    fn navigate(&self, destination: Destination) {
        match destination {
            Destination::Back => self.go_back(),
            Destination::Home => self.go_home(),
        }
    }
}

/// Prints navigation to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn go_back(&self) {
        debug!("Navigating back");
        println!("Going back.");
    }

    fn go_home(&self) {
        debug!("Navigating home");
        println!("Returning to main menu.");
    }
}
