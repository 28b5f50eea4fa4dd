//! State machine for word wars
//!
//! A war moves strictly forward: Waiting → Running → Finished. There is no
//! cancellation and no reopening; Finished is terminal. The state machine
//! defines:
//! - Valid states
//! - Events that trigger transitions
//! - Terminal states

use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot transition from {from} to {to} via {event}")]
    InvalidTransition {
        from: String,
        to: String,
        event: String,
    },

    #[error("Guard condition failed: {0}")]
    GuardFailed(String),

    #[error("Terminal state: {0} is a terminal state and cannot transition")]
    TerminalState(String),
}

/// Word war lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarState {
    Waiting,
    Running,
    Finished,
}

impl WarState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [WarState] {
        match self {
            Self::Waiting => &[Self::Running],
            Self::Running => &[Self::Finished],
            Self::Finished => &[],
        }
    }
}

impl std::fmt::Display for WarState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Events that trigger war state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum WarEvent {
    /// The host starts the round, fixing the sprint window
    Start,
    /// The round ends, either explicitly or by wall-clock expiry
    Finish,
}

impl std::fmt::Display for WarEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Finish => write!(f, "finish"),
        }
    }
}

/// Word war state machine
pub struct WarStateMachine;

impl WarStateMachine {
    /// Attempt a state transition
    ///
    /// Returns the new state if the transition is valid, or an error otherwise.
    pub fn transition(current: WarState, event: WarEvent) -> Result<WarState, StateError> {
        // Check for terminal state
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (&current, &event) {
            (WarState::Waiting, WarEvent::Start) => WarState::Running,
            (WarState::Running, WarEvent::Finish) => WarState::Finished,

            // Invalid transitions
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    to: "unknown".to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(current: WarState, event: &WarEvent) -> bool {
        Self::transition(current, event.clone()).is_ok()
    }
}
