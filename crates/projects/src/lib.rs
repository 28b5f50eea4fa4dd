//! Writeclub project directory
//!
//! Read-only project ownership checks. Joining a word war requires naming
//! the project whose words count toward the sprint, and that project must
//! belong to the joining user. Project CRUD lives elsewhere; this crate only
//! answers the ownership question, with a Postgres implementation for
//! production and an in-memory mock for tests.

use thiserror::Error;
use uuid::Uuid;

pub mod mock;
pub mod pg;

pub use mock::MockProjectDirectory;
pub use pg::PgProjectDirectory;

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

/// Project ownership contract consumed by the word war engine
#[async_trait::async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Whether `project_id` belongs to `user_id`
    async fn user_owns_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<bool, DirectoryError>;
}
