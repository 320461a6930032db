//! Database repository for per-user chapter progress.

use crate::{
    db::{
        errors::Result,
        handlers::repository::ProgressRepository,
        models::progress::{ProgressDBResponse, ProgressUpsertDBRequest},
    },
    types::UserId,
};
use sqlx::PgPool;
use tracing::instrument;

pub struct Progress {
    db: PgPool,
}

impl Progress {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl ProgressRepository for Progress {
    #[instrument(skip(self, request), fields(user_id = request.user_id, chapter_id = request.chapter_id), err)]
    async fn upsert(&self, request: &ProgressUpsertDBRequest) -> Result<ProgressDBResponse> {
        let progress = sqlx::query_as::<_, ProgressDBResponse>(
            r#"
            INSERT INTO user_progress (user_id, book_id, chapter_id, completed)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, chapter_id)
            DO UPDATE SET completed = EXCLUDED.completed, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.book_id)
        .bind(request.chapter_id)
        .bind(request.completed)
        .fetch_one(&self.db)
        .await?;

        Ok(progress)
    }

    #[instrument(skip(self), err)]
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ProgressDBResponse>> {
        let progress = sqlx::query_as::<_, ProgressDBResponse>(
            "SELECT * FROM user_progress WHERE user_id = $1 ORDER BY book_id, chapter_id",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(progress)
    }
}
