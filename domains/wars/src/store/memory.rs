//! In-memory war store
//!
//! Backs the engine in tests and local development without a database. All
//! state sits behind one mutex, so each conditional mutation checks its
//! predicate and applies its effect atomically, the same guarantee the
//! Postgres statements give via row-level isolation.
//!
//! Carries test instrumentation: counters for won transitions and word
//! writes, and a round-window override to simulate wall-clock expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{FinalRank, Participant, WarStatus, WordWar};
use crate::store::{StoreError, WarStore};

#[derive(Debug, Default)]
struct Inner {
    wars: HashMap<Uuid, WordWar>,
    participants: HashMap<Uuid, Participant>,
    final_ranks: HashMap<Uuid, Vec<FinalRank>>,

    start_transitions: u64,
    finish_transitions: u64,
    word_writes: u64,
    rank_snapshots: u64,
}

impl Inner {
    fn participant_entry(&self, war_id: Uuid, user_id: Uuid) -> Option<&Participant> {
        self.participants
            .values()
            .find(|p| p.war_id == war_id && p.user_id == user_id)
    }
}

/// In-memory war store for testing and local development
#[derive(Debug, Clone, Default)]
pub struct InMemoryWarStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryWarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of start transitions that actually took effect
    pub fn start_transition_count(&self) -> u64 {
        self.inner.lock().unwrap().start_transitions
    }

    /// Number of finish transitions that actually took effect
    pub fn finish_transition_count(&self) -> u64 {
        self.inner.lock().unwrap().finish_transitions
    }

    /// Number of word-count writes that actually took effect
    pub fn word_write_count(&self) -> u64 {
        self.inner.lock().unwrap().word_writes
    }

    /// Number of times a standings snapshot was persisted
    pub fn rank_snapshot_count(&self) -> u64 {
        self.inner.lock().unwrap().rank_snapshots
    }

    /// Overwrite a running war's sprint window (test control: lets a test
    /// move `ends_at` into the past without waiting out the round)
    pub fn set_round_window(
        &self,
        war_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(war) = inner.wars.get_mut(&war_id) {
            war.starts_at = Some(starts_at);
            war.ends_at = Some(ends_at);
        }
    }
}

#[async_trait::async_trait]
impl WarStore for InMemoryWarStore {
    async fn find_war(&self, war_id: Uuid) -> Result<Option<WordWar>, StoreError> {
        Ok(self.inner.lock().unwrap().wars.get(&war_id).cloned())
    }

    async fn find_open_for_event(&self, event_id: Uuid) -> Result<Option<WordWar>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .wars
            .values()
            .filter(|w| w.event_id == event_id && w.status.is_open())
            .max_by_key(|w| w.created_at)
            .cloned())
    }

    async fn insert_war(&self, war: &WordWar) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .wars
            .insert(war.id, war.clone());
        Ok(())
    }

    async fn start_war(
        &self,
        war_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        match inner.wars.get_mut(&war_id) {
            Some(war) if war.status == WarStatus::Waiting => {
                war.status = WarStatus::Running;
                war.starts_at = Some(starts_at);
                war.ends_at = Some(ends_at);
                war.updated_at = Utc::now();
                inner.start_transitions += 1;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn finish_war(
        &self,
        war_id: Uuid,
        finished_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        match inner.wars.get_mut(&war_id) {
            Some(war) if war.status == WarStatus::Running => {
                war.status = WarStatus::Finished;
                war.finished_at = Some(finished_at);
                war.updated_at = Utc::now();
                inner.finish_transitions += 1;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn find_participant(
        &self,
        war_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .participant_entry(war_id, user_id)
            .cloned())
    }

    async fn list_participants(&self, war_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Participant> = inner
            .participants
            .values()
            .filter(|p| p.war_id == war_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .participant_entry(participant.war_id, participant.user_id)
            .is_some()
        {
            return Ok(0);
        }
        inner
            .participants
            .insert(participant.id, participant.clone());
        Ok(1)
    }

    async fn delete_participant(&self, war_id: Uuid, user_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.participant_entry(war_id, user_id).map(|p| p.id);
        match id {
            Some(id) => {
                inner.participants.remove(&id);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_participant_words(
        &self,
        participant_id: Uuid,
        expected_words: i32,
        requested_words: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        match inner.participants.get_mut(&participant_id) {
            Some(p) if p.words_in_round == expected_words => {
                p.words_in_round = requested_words;
                p.updated_at = updated_at;
                inner.word_writes += 1;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn replace_final_ranks(
        &self,
        war_id: Uuid,
        ranks: &[FinalRank],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.final_ranks.insert(war_id, ranks.to_vec());
        inner.rank_snapshots += 1;
        Ok(())
    }

    async fn list_final_ranks(&self, war_id: Uuid) -> Result<Vec<FinalRank>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows = inner.final_ranks.get(&war_id).cloned().unwrap_or_default();
        rows.sort_by_key(|r| r.rank);
        Ok(rows)
    }
}
