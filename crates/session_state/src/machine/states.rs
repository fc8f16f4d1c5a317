//! Session phases - the states of the token lifecycle machine.

use serde::{Deserialize, Serialize};

/// Phases of the token lifecycle.
///
/// `Checking` means a silent token fetch is outstanding; `Idle` means the
/// machine is waiting for the next refresh trigger. The machine starts in
/// `Checking` because entering it is what kicks off the initial fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// A silent token fetch is in flight.
    Checking,
    /// Awaiting the next refresh trigger.
    Idle,
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Checking
    }
}

impl SessionPhase {
    /// True while a fetch attempt is outstanding.
    pub fn is_fetch_in_flight(&self) -> bool {
        matches!(self, Self::Checking)
    }

    /// Get a human-readable description of the current phase.
    pub fn description(&self) -> &str {
        match self {
            Self::Checking => "Fetching access token",
            Self::Idle => "Awaiting refresh trigger",
        }
    }
}
