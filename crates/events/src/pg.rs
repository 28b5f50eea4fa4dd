//! Postgres-backed event directory

use sqlx::PgPool;
use uuid::Uuid;

use crate::{DirectoryError, EventDirectory, EventSummary};

/// Event directory reading from the `events` table
#[derive(Clone)]
pub struct PgEventDirectory {
    pool: PgPool,
}

impl PgEventDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventDirectory for PgEventDirectory {
    async fn get_event(&self, event_id: Uuid) -> Result<Option<EventSummary>, DirectoryError> {
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT id, is_active, starts_at, ends_at FROM events WHERE id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    is_active: bool,
    starts_at: chrono::DateTime<chrono::Utc>,
    ends_at: chrono::DateTime<chrono::Utc>,
}

impl From<EventRow> for EventSummary {
    fn from(row: EventRow) -> Self {
        EventSummary {
            id: row.id,
            is_active: row.is_active,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
        }
    }
}
