//! Postgres-backed project directory

use sqlx::PgPool;
use uuid::Uuid;

use crate::{DirectoryError, ProjectDirectory};

/// Project directory reading from the `projects` table
#[derive(Clone)]
pub struct PgProjectDirectory {
    pool: PgPool,
}

impl PgProjectDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProjectDirectory for PgProjectDirectory {
    async fn user_owns_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<bool, DirectoryError> {
        let owns = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(owns)
    }
}
