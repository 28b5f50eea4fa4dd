//! Mock project directory
//!
//! In-memory ownership map for testing without a database.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::{DirectoryError, ProjectDirectory};

/// Mock project directory for testing
#[derive(Debug, Clone, Default)]
pub struct MockProjectDirectory {
    ownership: Arc<Mutex<HashSet<(Uuid, Uuid)>>>,
}

impl MockProjectDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `project_id` as belonging to `user_id`
    pub fn grant(&self, user_id: Uuid, project_id: Uuid) {
        self.ownership.lock().unwrap().insert((user_id, project_id));
    }

    /// Register a fresh project for `user_id`, returning its id
    pub fn grant_new_project(&self, user_id: Uuid) -> Uuid {
        let project_id = Uuid::new_v4();
        self.grant(user_id, project_id);
        project_id
    }
}

#[async_trait::async_trait]
impl ProjectDirectory for MockProjectDirectory {
    async fn user_owns_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<bool, DirectoryError> {
        Ok(self
            .ownership
            .lock()
            .unwrap()
            .contains(&(user_id, project_id)))
    }
}
