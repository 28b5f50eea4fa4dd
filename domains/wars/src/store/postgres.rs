//! Postgres-backed war store
//!
//! Every mutation is a single statement whose WHERE clause encodes the
//! expected prior state; `rows_affected()` reports whether the caller won.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{FinalRank, Participant, WordWar};
use crate::store::{StoreError, WarStore};

const WAR_COLUMNS: &str = "id, event_id, requested_by, duration_minutes, status, \
     starts_at, ends_at, finished_at, created_at, updated_at";

const PARTICIPANT_COLUMNS: &str =
    "id, war_id, user_id, project_id, words_in_round, joined_at, updated_at";

#[derive(Clone)]
pub struct PgWarStore {
    pool: PgPool,
}

impl PgWarStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WarStore for PgWarStore {
    async fn find_war(&self, war_id: Uuid) -> Result<Option<WordWar>, StoreError> {
        let query = format!("SELECT {WAR_COLUMNS} FROM word_wars WHERE id = $1");
        let row = sqlx::query_as::<_, WordWar>(&query)
            .bind(war_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_open_for_event(&self, event_id: Uuid) -> Result<Option<WordWar>, StoreError> {
        let query = format!(
            "SELECT {WAR_COLUMNS} FROM word_wars \
             WHERE event_id = $1 AND status IN ('waiting', 'running') \
             ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, WordWar>(&query)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_war(&self, war: &WordWar) -> Result<(), StoreError> {
        let query = format!(
            "INSERT INTO word_wars ({WAR_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        );
        sqlx::query(&query)
            .bind(war.id)
            .bind(war.event_id)
            .bind(war.requested_by)
            .bind(war.duration_minutes)
            .bind(war.status)
            .bind(war.starts_at)
            .bind(war.ends_at)
            .bind(war.finished_at)
            .bind(war.created_at)
            .bind(war.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn start_war(
        &self,
        war_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE word_wars \
             SET status = 'running', starts_at = $2, ends_at = $3, updated_at = NOW() \
             WHERE id = $1 AND status = 'waiting'",
        )
        .bind(war_id)
        .bind(starts_at)
        .bind(ends_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn finish_war(
        &self,
        war_id: Uuid,
        finished_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE word_wars \
             SET status = 'finished', finished_at = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'running'",
        )
        .bind(war_id)
        .bind(finished_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find_participant(
        &self,
        war_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, StoreError> {
        let query = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM war_participants \
             WHERE war_id = $1 AND user_id = $2"
        );
        let row = sqlx::query_as::<_, Participant>(&query)
            .bind(war_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_participants(&self, war_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        let query = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM war_participants \
             WHERE war_id = $1 ORDER BY joined_at, id"
        );
        let rows = sqlx::query_as::<_, Participant>(&query)
            .bind(war_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<u64, StoreError> {
        let query = format!(
            "INSERT INTO war_participants ({PARTICIPANT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (war_id, user_id) DO NOTHING"
        );
        let result = sqlx::query(&query)
            .bind(participant.id)
            .bind(participant.war_id)
            .bind(participant.user_id)
            .bind(participant.project_id)
            .bind(participant.words_in_round)
            .bind(participant.joined_at)
            .bind(participant.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_participant(&self, war_id: Uuid, user_id: Uuid) -> Result<u64, StoreError> {
        let result =
            sqlx::query("DELETE FROM war_participants WHERE war_id = $1 AND user_id = $2")
                .bind(war_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn update_participant_words(
        &self,
        participant_id: Uuid,
        expected_words: i32,
        requested_words: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE war_participants \
             SET words_in_round = $3, updated_at = $4 \
             WHERE id = $1 AND words_in_round = $2",
        )
        .bind(participant_id)
        .bind(expected_words)
        .bind(requested_words)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn replace_final_ranks(
        &self,
        war_id: Uuid,
        ranks: &[FinalRank],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM war_final_ranks WHERE war_id = $1")
            .bind(war_id)
            .execute(&mut *tx)
            .await?;

        for rank in ranks {
            sqlx::query(
                "INSERT INTO war_final_ranks (war_id, participant_id, words_in_round, rank) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(rank.war_id)
            .bind(rank.participant_id)
            .bind(rank.words_in_round)
            .bind(rank.rank)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_final_ranks(&self, war_id: Uuid) -> Result<Vec<FinalRank>, StoreError> {
        let rows = sqlx::query_as::<_, FinalRank>(
            "SELECT war_id, participant_id, words_in_round, rank \
             FROM war_final_ranks WHERE war_id = $1 ORDER BY rank",
        )
        .bind(war_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
