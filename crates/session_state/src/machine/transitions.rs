//! State transitions - FSM transition logic
//!
//! Implements the event-driven transition table for the token lifecycle,
//! together with the session side effects each transition applies.

use super::events::SessionEvent;
use super::states::SessionPhase;
use crate::session::Session;

/// Represents a state transition result.
#[derive(Debug, Clone)]
pub struct StateTransition {
    /// The phase before the transition.
    pub from: SessionPhase,
    /// The phase after the transition.
    pub to: SessionPhase,
    /// The event that triggered the transition.
    pub event: SessionEvent,
    /// Whether the phase actually changed.
    pub changed: bool,
}

/// State machine for the token lifecycle.
///
/// Owns the [`Session`] snapshot; every fetch outcome rewrites the snapshot
/// in one step, so observers reading it between events never see a partial
/// update.
#[derive(Debug, Clone)]
pub struct StateMachine {
    /// Current phase.
    phase: SessionPhase,
    /// Session snapshot derived from the last fetch outcome.
    session: Session,
    /// Transition history (limited).
    history: Vec<StateTransition>,
    /// Max history entries to keep.
    max_history: usize,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new machine in the `Checking` phase with an unloaded
    /// session. The owner is expected to run the initial fetch immediately.
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Checking,
            session: Session::unloaded(),
            history: Vec::new(),
            max_history: 50,
        }
    }

    /// Create a machine in a specific phase.
    pub fn with_phase(phase: SessionPhase) -> Self {
        Self {
            phase,
            session: Session::unloaded(),
            history: Vec::new(),
            max_history: 50,
        }
    }

    /// Get the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Get the current session snapshot.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get the transition history.
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Handle an event, transitioning phase and session together.
    pub fn handle_event(&mut self, event: SessionEvent) -> StateTransition {
        let from = self.phase;
        let to = Self::compute_next_phase(from, &event);
        let changed = from != to;

        // Session side effects apply only on real transitions; a stray
        // outcome in `Idle` or a re-entrant refresh leaves the snapshot
        // untouched.
        if changed {
            match &event {
                SessionEvent::FetchSucceeded { access_token } => {
                    self.session.apply_token(access_token);
                    log::info!(
                        "Token fetch succeeded (admin: {}, expires_at: {:?})",
                        self.session.is_admin,
                        self.session.expires_at
                    );
                }
                SessionEvent::FetchFailed { reason } => {
                    log::warn!("Token fetch failed, clearing session: {reason}");
                    self.session.clear();
                }
                SessionEvent::Refresh => {}
            }
        } else {
            log::debug!("Ignoring {event:?} in phase {from:?}");
        }

        self.phase = to;

        let transition = StateTransition {
            from,
            to,
            event,
            changed,
        };

        // Add to history
        self.history.push(transition.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        transition
    }

    /// Compute the next phase given the current phase and an event.
    fn compute_next_phase(phase: SessionPhase, event: &SessionEvent) -> SessionPhase {
        use SessionEvent::*;
        use SessionPhase::*;

        match (phase, event) {
            (Idle, Refresh) => Checking,
            (Checking, FetchSucceeded { .. }) => Idle,
            (Checking, FetchFailed { .. }) => Idle,

            // A refresh arriving while a fetch is in flight is dropped,
            // not queued; outcomes arriving in Idle are stray and ignored.
            _ => phase,
        }
    }

    /// Check whether an event would cause a phase change.
    pub fn can_transition(&self, event: &SessionEvent) -> bool {
        Self::compute_next_phase(self.phase, event) != self.phase
    }
}
