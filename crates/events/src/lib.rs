//! Writeclub event directory
//!
//! Read-only lookup of writing events. Word wars are nested inside an event
//! and may only be created while the event is active and inside its
//! start/end window; this crate provides that check as a narrow contract
//! with a Postgres implementation for production and an in-memory mock for
//! tests. Event CRUD itself lives elsewhere and is not part of this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod mock;
pub mod pg;

pub use mock::MockEventDirectory;
pub use pg::PgEventDirectory;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Directory query failed: {0}")]
    Query(#[from] sqlx::Error),
}

impl From<DirectoryError> for writeclub_common::Error {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Query(e) => writeclub_common::Error::Database(e),
        }
    }
}

/// Read model of an event as seen by the word war engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub is_active: bool,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl EventSummary {
    /// Whether the event accepts new activity at `now`
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now >= self.starts_at && now <= self.ends_at
    }
}

/// Event lookup contract consumed by the word war engine
#[async_trait::async_trait]
pub trait EventDirectory: Send + Sync {
    /// Fetch a single event, or `None` when it does not exist
    async fn get_event(&self, event_id: Uuid) -> Result<Option<EventSummary>, DirectoryError>;
}
