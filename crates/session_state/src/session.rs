//! Session snapshot shared with observers.

use serde::{Deserialize, Serialize};

use crate::claims::{TokenClaims, ADMIN_SCOPE};

/// Read-only view of the current authentication state.
///
/// All fields are rewritten together when the machine handles a fetch
/// outcome; observers never see a half-applied token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer credential, present only while authenticated.
    pub access_token: Option<String>,
    /// Whether at least one fetch attempt has completed, success or not.
    pub is_loaded: bool,
    /// Whether the last fetch attempt succeeded.
    pub is_authenticated: bool,
    /// Whether the token's scope claim grants [`ADMIN_SCOPE`]. UI hint
    /// only; the server re-checks authorization on every call.
    pub is_admin: bool,
    /// Token expiry in epoch milliseconds, when the token carries one.
    pub expires_at: Option<i64>,
}

impl Session {
    /// Session before any fetch attempt has completed.
    pub fn unloaded() -> Self {
        Self::default()
    }

    pub(crate) fn apply_token(&mut self, token: &str) {
        self.access_token = Some(token.to_string());
        self.is_authenticated = true;
        self.is_loaded = true;
        match TokenClaims::decode(token) {
            Some(claims) => {
                self.is_admin = claims.has_scope(ADMIN_SCOPE);
                self.expires_at = claims.expires_at_millis();
            }
            None => {
                // An undecodable token still authenticates; it just never
                // unlocks admin affordances.
                self.is_admin = false;
                self.expires_at = None;
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.access_token = None;
        self.is_authenticated = false;
        self.is_admin = false;
        self.expires_at = None;
        self.is_loaded = true;
    }
}
