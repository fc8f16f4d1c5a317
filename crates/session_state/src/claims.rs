//! Best-effort access-token claim decoding.
//!
//! The signature is deliberately not verified: these claims only gate
//! client-side affordances, and the backend validates the token on every
//! request it receives.

use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Scope string that unlocks admin-only affordances.
pub const ADMIN_SCOPE: &str = "site:admin";

/// Claims the client cares about. Everything else in the payload is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Space-separated list of granted scopes.
    pub scope: Option<String>,
    /// Expiry, seconds since the epoch.
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decode claims from a JWT without verifying the signature.
    ///
    /// Returns `None` for anything that does not parse as a JWT. Callers
    /// treat that as "no claims", never as an authentication failure.
    pub fn decode(token: &str) -> Option<Self> {
        // Accept whatever algorithm the header names; nothing is verified
        // here anyway.
        let header = jsonwebtoken::decode_header(token).ok()?;
        let mut validation = Validation::new(header.alg);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        match jsonwebtoken::decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(&[]),
            &validation,
        ) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                log::debug!("Failed to decode token claims: {err}");
                None
            }
        }
    }

    /// Whether the scope claim contains `wanted`.
    pub fn has_scope(&self, wanted: &str) -> bool {
        self.scope
            .as_deref()
            .map(|scopes| scopes.split_whitespace().any(|scope| scope == wanted))
            .unwrap_or(false)
    }

    /// Expiry in epoch milliseconds, when the token carries an `exp` claim.
    pub fn expires_at_millis(&self) -> Option<i64> {
        self.exp.map(|secs| secs * 1000)
    }
}
