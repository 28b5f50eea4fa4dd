//! Store contract for the word war engine
//!
//! The engine owns no in-process state; everything lives behind this
//! contract. Correctness rests on the conditional mutations executing
//! atomically: each write's predicate encodes the expected prior state and
//! the affected-row count tells the engine whether it won the transition.
//! Zero-effect results are reconciled by the engine with a single re-read,
//! never by retry loops or locks.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{FinalRank, Participant, WordWar};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryWarStore;
pub use postgres::PgWarStore;

/// Store-level failures, propagated untouched to the caller
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store query failed: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl From<StoreError> for writeclub_common::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection(e) => writeclub_common::Error::Database(e),
            StoreError::InvalidData(msg) => writeclub_common::Error::Internal(msg),
        }
    }
}

/// Conditional-write primitives over wars, participants and final ranks
///
/// Mutating methods return the affected-row count; `1` means the caller won
/// the transition, `0` means the predicate no longer held when the write
/// executed.
#[async_trait::async_trait]
pub trait WarStore: Send + Sync {
    /// Point read of a war by id
    async fn find_war(&self, war_id: Uuid) -> Result<Option<WordWar>, StoreError>;

    /// The event's open war (waiting or running), if any
    async fn find_open_for_event(&self, event_id: Uuid) -> Result<Option<WordWar>, StoreError>;

    /// Insert a freshly created waiting war
    async fn insert_war(&self, war: &WordWar) -> Result<(), StoreError>;

    /// Transition to running, predicated on the war still waiting
    async fn start_war(
        &self,
        war_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Transition to finished, predicated on the war still running
    async fn finish_war(&self, war_id: Uuid, finished_at: DateTime<Utc>)
        -> Result<u64, StoreError>;

    /// Point read of a participant by `(war_id, user_id)`
    async fn find_participant(
        &self,
        war_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, StoreError>;

    /// All participants of a war in join order
    async fn list_participants(&self, war_id: Uuid) -> Result<Vec<Participant>, StoreError>;

    /// Insert a participant unless one already exists for `(war_id, user_id)`
    async fn insert_participant(&self, participant: &Participant) -> Result<u64, StoreError>;

    /// Delete the participant row for `(war_id, user_id)`, if present
    async fn delete_participant(&self, war_id: Uuid, user_id: Uuid) -> Result<u64, StoreError>;

    /// Update a participant's word count, predicated on the previously-read
    /// value so a concurrent higher submission is never clobbered
    async fn update_participant_words(
        &self,
        participant_id: Uuid,
        expected_words: i32,
        requested_words: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Replace the final standings snapshot for a war
    async fn replace_final_ranks(
        &self,
        war_id: Uuid,
        ranks: &[FinalRank],
    ) -> Result<(), StoreError>;

    /// The persisted final standings in rank order
    async fn list_final_ranks(&self, war_id: Uuid) -> Result<Vec<FinalRank>, StoreError>;
}
