//! Session events - what drives the token lifecycle machine.

use serde::{Deserialize, Serialize};

/// Events the session machine responds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    /// Ask for a fresh token. Dropped while a fetch is already in flight.
    Refresh,

    /// The silent token fetch resolved with a credential.
    FetchSucceeded { access_token: String },

    /// The silent token fetch failed.
    FetchFailed { reason: String },
}

impl SessionEvent {
    /// True for events originating outside the machine (user or timer).
    pub fn is_trigger(&self) -> bool {
        matches!(self, Self::Refresh)
    }

    /// True for events reporting the outcome of a fetch.
    pub fn is_fetch_outcome(&self) -> bool {
        matches!(self, Self::FetchSucceeded { .. } | Self::FetchFailed { .. })
    }
}
