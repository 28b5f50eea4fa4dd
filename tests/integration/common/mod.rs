//! Common test utilities and fixtures for integration tests
//!
//! Everything runs against the in-memory store and mock gate directories, so
//! no database is required. `RacingWarStore` wraps the in-memory store to
//! deterministically lose a conditional write to a simulated rival, which is
//! the only way to drive the engine's reconciliation paths from the outside.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use writeclub_events::MockEventDirectory;
use writeclub_projects::MockProjectDirectory;
use writeclub_wars::store::StoreError;
use writeclub_wars::{FinalRank, InMemoryWarStore, Participant, WarService, WarStore, WordWar};

/// Engine wired to the in-memory store and mock directories
#[allow(dead_code)]
pub struct TestEngine {
    pub service: WarService,
    pub store: Arc<InMemoryWarStore>,
    pub events: MockEventDirectory,
    pub projects: MockProjectDirectory,
}

#[allow(dead_code)]
impl TestEngine {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryWarStore::new());
        Self::with_store(store.clone(), store)
    }

    /// Build an engine over an arbitrary store (e.g. a `RacingWarStore`),
    /// keeping a handle to the underlying in-memory store for assertions
    pub fn with_store(store: Arc<dyn WarStore>, inner: Arc<InMemoryWarStore>) -> Self {
        let events = MockEventDirectory::new();
        let projects = MockProjectDirectory::new();
        let service = WarService::new(
            store,
            Arc::new(events.clone()),
            Arc::new(projects.clone()),
        );
        TestEngine {
            service,
            store: inner,
            events,
            projects,
        }
    }

    /// Create a waiting war inside a fresh active event; returns (war, host)
    pub async fn waiting_war(&self) -> (Uuid, Uuid) {
        let event_id = self.events.insert_active_event();
        let host = Uuid::new_v4();
        let war_id = self.service.create_war(event_id, host, 10).await.unwrap();
        (war_id, host)
    }

    /// Create a fresh user with an owned project and join it to the war
    pub async fn join_new_user(&self, war_id: Uuid) -> Uuid {
        let user_id = Uuid::new_v4();
        let project_id = self.projects.grant_new_project(user_id);
        self.service
            .join_war(war_id, user_id, project_id)
            .await
            .unwrap();
        user_id
    }

    /// Create a running war with one participant; returns (war, host, user)
    pub async fn running_war_with_participant(&self) -> (Uuid, Uuid, Uuid) {
        let (war_id, host) = self.waiting_war().await;
        let user_id = self.join_new_user(war_id).await;
        self.service.start_war(war_id, host).await.unwrap();
        (war_id, host, user_id)
    }
}

/// Store wrapper that deterministically loses one conditional write
///
/// When armed, a mutation first applies a rival's write against the inner
/// store and then executes the caller's, so the caller's predicate no
/// longer holds and the engine must walk its reconciliation path.
#[allow(dead_code)]
pub struct RacingWarStore {
    inner: Arc<InMemoryWarStore>,
    rival_start: AtomicBool,
    rival_finish: AtomicBool,
    rival_join: AtomicBool,
    rival_leave: AtomicBool,
    rival_words: Mutex<Option<i32>>,
}

#[allow(dead_code)]
impl RacingWarStore {
    pub fn new(inner: Arc<InMemoryWarStore>) -> Self {
        Self {
            inner,
            rival_start: AtomicBool::new(false),
            rival_finish: AtomicBool::new(false),
            rival_join: AtomicBool::new(false),
            rival_leave: AtomicBool::new(false),
            rival_words: Mutex::new(None),
        }
    }

    pub fn arm_rival_start(&self) {
        self.rival_start.store(true, Ordering::SeqCst);
    }

    pub fn arm_rival_finish(&self) {
        self.rival_finish.store(true, Ordering::SeqCst);
    }

    pub fn arm_rival_join(&self) {
        self.rival_join.store(true, Ordering::SeqCst);
    }

    pub fn arm_rival_leave(&self) {
        self.rival_leave.store(true, Ordering::SeqCst);
    }

    pub fn arm_rival_words(&self, words: i32) {
        *self.rival_words.lock().unwrap() = Some(words);
    }
}

#[async_trait::async_trait]
impl WarStore for RacingWarStore {
    async fn find_war(&self, war_id: Uuid) -> Result<Option<WordWar>, StoreError> {
        self.inner.find_war(war_id).await
    }

    async fn find_open_for_event(&self, event_id: Uuid) -> Result<Option<WordWar>, StoreError> {
        self.inner.find_open_for_event(event_id).await
    }

    async fn insert_war(&self, war: &WordWar) -> Result<(), StoreError> {
        self.inner.insert_war(war).await
    }

    async fn start_war(
        &self,
        war_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        if self.rival_start.swap(false, Ordering::SeqCst) {
            self.inner.start_war(war_id, starts_at, ends_at).await?;
        }
        self.inner.start_war(war_id, starts_at, ends_at).await
    }

    async fn finish_war(
        &self,
        war_id: Uuid,
        finished_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        if self.rival_finish.swap(false, Ordering::SeqCst) {
            self.inner.finish_war(war_id, finished_at).await?;
        }
        self.inner.finish_war(war_id, finished_at).await
    }

    async fn find_participant(
        &self,
        war_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, StoreError> {
        self.inner.find_participant(war_id, user_id).await
    }

    async fn list_participants(&self, war_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        self.inner.list_participants(war_id).await
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<u64, StoreError> {
        if self.rival_join.swap(false, Ordering::SeqCst) {
            let rival = Participant::new(
                participant.war_id,
                participant.user_id,
                participant.project_id,
            );
            self.inner.insert_participant(&rival).await?;
        }
        self.inner.insert_participant(participant).await
    }

    async fn delete_participant(&self, war_id: Uuid, user_id: Uuid) -> Result<u64, StoreError> {
        if self.rival_leave.swap(false, Ordering::SeqCst) {
            self.inner.delete_participant(war_id, user_id).await?;
        }
        self.inner.delete_participant(war_id, user_id).await
    }

    async fn update_participant_words(
        &self,
        participant_id: Uuid,
        expected_words: i32,
        requested_words: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let rival = self.rival_words.lock().unwrap().take();
        if let Some(words) = rival {
            self.inner
                .update_participant_words(participant_id, expected_words, words, updated_at)
                .await?;
        }
        self.inner
            .update_participant_words(participant_id, expected_words, requested_words, updated_at)
            .await
    }

    async fn replace_final_ranks(
        &self,
        war_id: Uuid,
        ranks: &[FinalRank],
    ) -> Result<(), StoreError> {
        self.inner.replace_final_ranks(war_id, ranks).await
    }

    async fn list_final_ranks(&self, war_id: Uuid) -> Result<Vec<FinalRank>, StoreError> {
        self.inner.list_final_ranks(war_id).await
    }
}
