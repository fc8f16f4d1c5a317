use thiserror::Error;

/// Error taxonomy for the client.
///
/// Config failures are fatal to the session; token failures demote it to
/// unauthenticated; chat and knowledge failures are per-operation and leave
/// the session alone. Nothing in here retries automatically.
#[derive(Debug, Error)]
pub enum Error {
    /// The global configuration could not be fetched or parsed.
    #[error("global config fetch failed: {0}")]
    ConfigLoad(String),

    /// The silent token fetch was rejected by the provider.
    #[error("token fetch failed: {0}")]
    TokenFetch(String),

    /// An operation that needs a bearer token ran without one.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The server answered with a non-success status.
    #[error("server returned {status}: {reason}")]
    Status {
        status: reqwest::StatusCode,
        reason: String,
    },

    /// Network-level failure talking to the server.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A knowledge-base submission failed local validation.
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),
}

pub type Result<T> = std::result::Result<T, Error>;
