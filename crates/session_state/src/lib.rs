//! session_state - Token lifecycle state machine
//!
//! Pure state machine for the bearer-token session lifecycle. No I/O lives
//! here: the client crate performs the actual silent token fetch and drives
//! this machine with the outcome events.

pub mod claims;
pub mod machine;
pub mod session;

// Re-export commonly used types
pub use claims::{TokenClaims, ADMIN_SCOPE};
pub use machine::{SessionEvent, SessionPhase, StateMachine, StateTransition};
pub use session::Session;
