//! Word war engine operations
//!
//! Six mutating operations (create, join, leave, start, checkpoint, finish)
//! plus the read-only scoreboard. Every mutation follows the same shape: one
//! conditional write whose predicate encodes the expected prior state, and
//! (only when that write reports zero affected rows) one reconciliation read
//! that classifies the result as a benign race (another caller already got
//! us to the desired end state) or a genuine conflict. The engine never
//! retries and holds no locks.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use writeclub_common::{Error, Result};
use writeclub_events::EventDirectory;
use writeclub_projects::ProjectDirectory;

use crate::domain::entities::{FinalRank, Participant, WarStatus, WordWar};
use crate::store::WarStore;

/// One scoreboard line, provisional while the war runs and frozen from the
/// final standings snapshot once it is finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreboardEntry {
    pub participant_id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub words_in_round: i32,
    pub rank: i32,
}

/// Scoreboard read model for a single war
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoreboard {
    pub war: WordWar,
    pub entries: Vec<ScoreboardEntry>,
}

/// The word war engine
///
/// Holds no mutable state of its own; safe to clone and invoke concurrently.
#[derive(Clone)]
pub struct WarService {
    store: Arc<dyn WarStore>,
    events: Arc<dyn EventDirectory>,
    projects: Arc<dyn ProjectDirectory>,
}

impl WarService {
    pub fn new(
        store: Arc<dyn WarStore>,
        events: Arc<dyn EventDirectory>,
        projects: Arc<dyn ProjectDirectory>,
    ) -> Self {
        Self {
            store,
            events,
            projects,
        }
    }

    /// Create a new waiting war inside an active event
    ///
    /// The sprint window stays unset until Start; the timer begins when the
    /// host presses Start, not at creation.
    pub async fn create_war(
        &self,
        event_id: Uuid,
        requested_by: Uuid,
        duration_minutes: i32,
    ) -> Result<Uuid> {
        if duration_minutes <= 0 {
            return Err(Error::Validation(
                "Duration must be a positive number of minutes".to_string(),
            ));
        }

        let event = self
            .events
            .get_event(event_id)
            .await?
            .ok_or_else(|| Error::NotFound("Event not found".to_string()))?;

        if !event.is_open_at(Utc::now()) {
            return Err(Error::RuleViolation(
                "The event is not currently running".to_string(),
            ));
        }

        // Advisory check; the partial unique index on event_id is the
        // backstop under simultaneous creates
        if self.store.find_open_for_event(event_id).await?.is_some() {
            return Err(Error::RuleViolation(
                "A word war is already pending or running for this event".to_string(),
            ));
        }

        let war = WordWar::new(event_id, requested_by, duration_minutes)?;
        self.store.insert_war(&war).await?;

        tracing::info!(war_id = %war.id, %event_id, "word war created");
        Ok(war.id)
    }

    /// Join a waiting war with one of the caller's own projects
    ///
    /// Idempotent: a second join by the same user reports success without a
    /// second row.
    pub async fn join_war(&self, war_id: Uuid, user_id: Uuid, project_id: Uuid) -> Result<bool> {
        let war = self.require_war(war_id).await?;

        if war.status != WarStatus::Waiting {
            return Err(Error::RuleViolation(
                "Joining is only possible while the war is waiting".to_string(),
            ));
        }

        if !self.projects.user_owns_project(user_id, project_id).await? {
            return Err(Error::RuleViolation(
                "Project does not belong to the joining user".to_string(),
            ));
        }

        if self.store.find_participant(war_id, user_id).await?.is_some() {
            return Ok(true);
        }

        let participant = Participant::new(war_id, user_id, project_id);
        let affected = self.store.insert_participant(&participant).await?;
        if affected == 1 {
            return Ok(true);
        }

        // Zero-effect insert: either a concurrent join by the same user won,
        // or the state genuinely moved under us
        if self.store.find_participant(war_id, user_id).await?.is_some() {
            tracing::debug!(%war_id, %user_id, "join lost a benign race");
            return Ok(true);
        }
        Err(Error::RuleViolation(
            "State conflict while joining the war".to_string(),
        ))
    }

    /// Leave a waiting war
    ///
    /// Idempotent: leaving a war the user never joined (or already left)
    /// reports success.
    pub async fn leave_war(&self, war_id: Uuid, user_id: Uuid) -> Result<bool> {
        let war = self.require_war(war_id).await?;

        if war.status != WarStatus::Waiting {
            return Err(Error::RuleViolation(
                "Leaving is only possible while the war is waiting".to_string(),
            ));
        }

        if self.store.find_participant(war_id, user_id).await?.is_none() {
            return Ok(true);
        }

        let affected = self.store.delete_participant(war_id, user_id).await?;
        if affected == 1 {
            return Ok(true);
        }

        if self.store.find_participant(war_id, user_id).await?.is_none() {
            tracing::debug!(%war_id, %user_id, "leave lost a benign race");
            return Ok(true);
        }
        Err(Error::RuleViolation(
            "State conflict while leaving the war".to_string(),
        ))
    }

    /// Start the round, fixing the sprint window from "now"
    ///
    /// Of N concurrent starts exactly one wins the transition; the rest
    /// reconcile to idempotent success without resetting the timer.
    pub async fn start_war(&self, war_id: Uuid, requested_by: Uuid) -> Result<()> {
        let war = self.require_war(war_id).await?;

        if war.status != WarStatus::Waiting {
            return Err(Error::RuleViolation(
                "Starting is only possible while the war is waiting".to_string(),
            ));
        }

        // A stored non-positive duration is a corruption signal, not a
        // caller input error
        if war.duration_minutes <= 0 {
            return Err(Error::RuleViolation(
                "War has an invalid stored duration".to_string(),
            ));
        }

        let now = Utc::now();
        let (starts_at, ends_at) = war.round_window(now);

        let affected = self.store.start_war(war_id, starts_at, ends_at).await?;
        if affected == 1 {
            tracing::info!(%war_id, %requested_by, %ends_at, "word war started");
            return Ok(());
        }

        let current = self.require_war(war_id).await?;
        if current.status == WarStatus::Running {
            // A concurrent start won the race; its window stands
            tracing::debug!(%war_id, "start lost a benign race");
            return Ok(());
        }
        Err(Error::RuleViolation(
            "State conflict while starting the war".to_string(),
        ))
    }

    /// Record a participant's word count for the round
    ///
    /// Checks wall-clock expiry first: a checkpoint landing after `ends_at`
    /// finishes the war (if nobody else has yet) and is then rejected
    /// unconditionally. Word counts are monotonic: equal resubmissions are
    /// idempotent successes with no write, lower ones are violations.
    pub async fn checkpoint(
        &self,
        war_id: Uuid,
        user_id: Uuid,
        words_in_round: i32,
    ) -> Result<bool> {
        if words_in_round < 0 {
            return Err(Error::Validation(
                "Word count cannot be negative".to_string(),
            ));
        }

        let war = self.require_war(war_id).await?;

        let now = Utc::now();
        if war.is_expired_at(now) {
            self.auto_finish(war_id).await?;
            return Err(Error::RuleViolation(
                "The round is over; the war was auto-finished by time".to_string(),
            ));
        }

        if war.status != WarStatus::Running {
            return Err(Error::RuleViolation(
                "Checkpoints are only possible while the war is running".to_string(),
            ));
        }

        let participant = self
            .store
            .find_participant(war_id, user_id)
            .await?
            .ok_or_else(|| Error::NotFound("Participant not found for this war".to_string()))?;

        if words_in_round < participant.words_in_round {
            return Err(Error::RuleViolation(
                "Word count cannot decrease".to_string(),
            ));
        }
        if words_in_round == participant.words_in_round {
            return Ok(true);
        }

        let affected = self
            .store
            .update_participant_words(
                participant.id,
                participant.words_in_round,
                words_in_round,
                now,
            )
            .await?;
        if affected == 1 {
            return Ok(true);
        }

        // Guarded write lost: a concurrent submission moved the count
        if let Some(current) = self.store.find_participant(war_id, user_id).await? {
            if current.words_in_round >= words_in_round {
                tracing::debug!(%war_id, %user_id, "checkpoint lost a benign race");
                return Ok(true);
            }
        }

        let current_war = self.require_war(war_id).await?;
        if current_war.status != WarStatus::Running {
            return Err(Error::RuleViolation(
                "Checkpoints are only possible while the war is running".to_string(),
            ));
        }
        Err(Error::RuleViolation(
            "State conflict while recording the checkpoint".to_string(),
        ))
    }

    /// End the round and persist the final standings snapshot
    ///
    /// Idempotent under races: a finish that loses to a concurrent finish
    /// (including the checkpoint auto-finish path) reconciles to success.
    pub async fn finish_war(&self, war_id: Uuid) -> Result<()> {
        let war = self.require_war(war_id).await?;

        if war.status != WarStatus::Running {
            return Err(Error::RuleViolation(
                "Finishing is only possible while the war is running".to_string(),
            ));
        }

        self.finish_and_rank(war_id).await
    }

    /// Scoreboard for a war: the frozen snapshot once finished, a
    /// provisionally-ranked live view otherwise
    pub async fn scoreboard(&self, war_id: Uuid) -> Result<Scoreboard> {
        let war = self.require_war(war_id).await?;
        let participants = self.store.list_participants(war_id).await?;

        let entries = if war.status == WarStatus::Finished {
            let ranks = self.store.list_final_ranks(war_id).await?;
            ranks
                .into_iter()
                .filter_map(|rank| {
                    participants
                        .iter()
                        .find(|p| p.id == rank.participant_id)
                        .map(|p| ScoreboardEntry {
                            participant_id: p.id,
                            user_id: p.user_id,
                            project_id: p.project_id,
                            words_in_round: rank.words_in_round,
                            rank: rank.rank,
                        })
                })
                .collect()
        } else {
            Self::rank_participants(participants)
                .into_iter()
                .map(|(rank, p)| ScoreboardEntry {
                    participant_id: p.id,
                    user_id: p.user_id,
                    project_id: p.project_id,
                    words_in_round: p.words_in_round,
                    rank,
                })
                .collect()
        };

        Ok(Scoreboard { war, entries })
    }

    /// Finish effect shared by the explicit operation and the checkpoint
    /// time guard: conditional transition, reconciliation, then the ranking
    /// finalizer on every success path (it is idempotent, so running it on a
    /// reconciled success only repairs a potentially torn earlier attempt)
    async fn finish_and_rank(&self, war_id: Uuid) -> Result<()> {
        let now = Utc::now();
        let affected = self.store.finish_war(war_id, now).await?;

        if affected == 0 {
            let current = self.require_war(war_id).await?;
            if current.status != WarStatus::Finished {
                return Err(Error::RuleViolation(
                    "Finishing is only possible while the war is running".to_string(),
                ));
            }
            tracing::debug!(%war_id, "finish lost a benign race");
        } else {
            tracing::info!(%war_id, "word war finished");
        }

        self.finalize_ranking(war_id).await
    }

    /// Time-guard finish: the checkpoint must be rejected afterwards whether
    /// this call won the transition, lost it to a concurrent finisher, or
    /// found the war already closed. Only store failures propagate
    async fn auto_finish(&self, war_id: Uuid) -> Result<()> {
        match self.finish_and_rank(war_id).await {
            Ok(()) => Ok(()),
            Err(Error::RuleViolation(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Compute and persist the final standings
    ///
    /// Deterministic and idempotent: unchanged inputs yield an identical
    /// snapshot, so a retry after a partial failure is safe.
    async fn finalize_ranking(&self, war_id: Uuid) -> Result<()> {
        let participants = self.store.list_participants(war_id).await?;
        let ranks: Vec<FinalRank> = Self::rank_participants(participants)
            .into_iter()
            .map(|(rank, p)| FinalRank {
                war_id,
                participant_id: p.id,
                words_in_round: p.words_in_round,
                rank,
            })
            .collect();

        self.store.replace_final_ranks(war_id, &ranks).await?;
        tracing::debug!(%war_id, entries = ranks.len(), "final standings persisted");
        Ok(())
    }

    /// Standings order: highest word count first; ties keep join order
    /// (participants arrive join-ordered and the sort is stable)
    fn rank_participants(mut participants: Vec<Participant>) -> Vec<(i32, Participant)> {
        participants.sort_by(|a, b| b.words_in_round.cmp(&a.words_in_round));
        participants
            .into_iter()
            .enumerate()
            .map(|(i, p)| (i as i32 + 1, p))
            .collect()
    }

    async fn require_war(&self, war_id: Uuid) -> Result<WordWar> {
        self.store
            .find_war(war_id)
            .await?
            .ok_or_else(|| Error::NotFound("Word war not found".to_string()))
    }
}
