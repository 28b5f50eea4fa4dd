//! Word war domain entities
//!
//! Entities are plain rows as stored; business transitions go through the
//! state machine so the forward-only lifecycle holds everywhere.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use writeclub_common::{Error, Result};

use crate::domain::state::{StateError, WarEvent, WarState, WarStateMachine};

/// Word war status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "war_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WarStatus {
    #[default]
    Waiting,
    Running,
    Finished,
}

impl WarStatus {
    /// Check if status is terminal (the round has ended)
    pub fn is_terminal(&self) -> bool {
        self.to_state().is_terminal()
    }

    /// Whether the war still occupies its event's single open slot
    pub fn is_open(&self) -> bool {
        matches!(self, WarStatus::Waiting | WarStatus::Running)
    }

    /// Convert to state machine state
    pub fn to_state(&self) -> WarState {
        match self {
            WarStatus::Waiting => WarState::Waiting,
            WarStatus::Running => WarState::Running,
            WarStatus::Finished => WarState::Finished,
        }
    }

    /// Create from state machine state
    pub fn from_state(state: WarState) -> Self {
        match state {
            WarState::Waiting => WarStatus::Waiting,
            WarState::Running => WarStatus::Running,
            WarState::Finished => WarStatus::Finished,
        }
    }
}

/// Word war entity
///
/// `starts_at`/`ends_at` stay unset until the host presses Start; the timer
/// begins at the actual start, not at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WordWar {
    pub id: Uuid,
    pub event_id: Uuid,
    pub requested_by: Uuid,
    pub duration_minutes: i32,
    pub status: WarStatus,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WordWar {
    /// Create a new waiting war with validation
    pub fn new(event_id: Uuid, requested_by: Uuid, duration_minutes: i32) -> Result<Self> {
        if duration_minutes <= 0 {
            return Err(Error::Validation(
                "Duration must be a positive number of minutes".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(WordWar {
            id: Uuid::new_v4(),
            event_id,
            requested_by,
            duration_minutes,
            status: WarStatus::default(),
            starts_at: None,
            ends_at: None,
            finished_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Check if the war has ended
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The sprint window computed from a start instant
    pub fn round_window(&self, starts_at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            starts_at,
            starts_at + Duration::minutes(i64::from(self.duration_minutes)),
        )
    }

    /// Whether the round's wall clock has expired at `now`
    ///
    /// Only meaningful while Running; a war without an end instant never
    /// expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.ends_at {
            Some(ends_at) => self.status == WarStatus::Running && now >= ends_at,
            None => false,
        }
    }

    /// Start the round, fixing the sprint window
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        let new_state = self.apply_transition(WarEvent::Start)?;
        let (starts_at, ends_at) = self.round_window(now);
        self.status = WarStatus::from_state(new_state);
        self.starts_at = Some(starts_at);
        self.ends_at = Some(ends_at);
        self.updated_at = now;
        Ok(())
    }

    /// End the round
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<()> {
        let new_state = self.apply_transition(WarEvent::Finish)?;
        self.status = WarStatus::from_state(new_state);
        self.finished_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Apply a state transition using the state machine
    fn apply_transition(&self, event: WarEvent) -> Result<WarState> {
        let current_state = self.status.to_state();
        WarStateMachine::transition(current_state, event).map_err(|e| match e {
            StateError::InvalidTransition { from, event, .. } => Error::RuleViolation(format!(
                "Invalid war transition: cannot apply '{}' event from '{}' state",
                event, from
            )),
            StateError::TerminalState(state) => Error::RuleViolation(format!(
                "War is in terminal state '{}' and cannot transition",
                state
            )),
            StateError::GuardFailed(msg) => Error::RuleViolation(msg),
        })
    }
}

/// A user's enrollment in a specific war
///
/// Unique per `(war_id, user_id)`; `words_in_round` never decreases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    pub id: Uuid,
    pub war_id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub words_in_round: i32,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    /// Create a new participant with a zero word count
    pub fn new(war_id: Uuid, user_id: Uuid, project_id: Uuid) -> Self {
        let now = Utc::now();
        Participant {
            id: Uuid::new_v4(),
            war_id,
            user_id,
            project_id,
            words_in_round: 0,
            joined_at: now,
            updated_at: now,
        }
    }
}

/// One row of the final standings snapshot persisted at finish time
///
/// Keyed by `(war_id, participant_id)` and carrying no fresh ids or
/// timestamps, so re-finalizing with unchanged inputs writes an identical
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FinalRank {
    pub war_id: Uuid,
    pub participant_id: Uuid,
    pub words_in_round: i32,
    pub rank: i32,
}
