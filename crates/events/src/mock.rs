//! Mock event directory
//!
//! In-memory event lookup for testing without a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{DirectoryError, EventDirectory, EventSummary};

/// Mock event directory for testing
#[derive(Debug, Clone, Default)]
pub struct MockEventDirectory {
    events: Arc<Mutex<HashMap<Uuid, EventSummary>>>,
}

impl MockEventDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event
    pub fn insert(&self, event: EventSummary) {
        self.events.lock().unwrap().insert(event.id, event);
    }

    /// Register an active event whose window comfortably surrounds "now",
    /// returning its id
    pub fn insert_active_event(&self) -> Uuid {
        let now = Utc::now();
        let event = EventSummary {
            id: Uuid::new_v4(),
            is_active: true,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
        };
        let id = event.id;
        self.insert(event);
        id
    }

    /// Register an inactive event, returning its id
    pub fn insert_inactive_event(&self) -> Uuid {
        let now = Utc::now();
        let event = EventSummary {
            id: Uuid::new_v4(),
            is_active: false,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
        };
        let id = event.id;
        self.insert(event);
        id
    }

    /// Register an active event whose window already closed, returning its id
    pub fn insert_ended_event(&self) -> Uuid {
        let now = Utc::now();
        let event = EventSummary {
            id: Uuid::new_v4(),
            is_active: true,
            starts_at: now - Duration::days(2),
            ends_at: now - Duration::days(1),
        };
        let id = event.id;
        self.insert(event);
        id
    }
}

#[async_trait::async_trait]
impl EventDirectory for MockEventDirectory {
    async fn get_event(&self, event_id: Uuid) -> Result<Option<EventSummary>, DirectoryError> {
        Ok(self.events.lock().unwrap().get(&event_id).cloned())
    }
}
