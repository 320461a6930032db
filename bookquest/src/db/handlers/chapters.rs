//! Database repository for chapters.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::chapters::{ChapterCreateDBRequest, ChapterDBResponse, ChapterUpdateDBRequest},
    },
    types::{BookId, ChapterId},
};
use sqlx::PgPool;
use tracing::instrument;

pub struct Chapters {
    db: PgPool,
}

impl Chapters {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Repository for Chapters {
    type CreateRequest = ChapterCreateDBRequest;
    type UpdateRequest = ChapterUpdateDBRequest;
    type Response = ChapterDBResponse;
    type Id = ChapterId;
    /// Chapters are only ever listed per book
    type Filter = BookId;

    #[instrument(skip(self, request), fields(book_id = request.book_id), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let chapter = sqlx::query_as::<_, ChapterDBResponse>(
            r#"
            INSERT INTO chapters (book_id, title, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(request.book_id)
        .bind(&request.title)
        .bind(&request.content)
        .fetch_one(&self.db)
        .await?;

        Ok(chapter)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        let chapter = sqlx::query_as::<_, ChapterDBResponse>("SELECT * FROM chapters WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(chapter)
    }

    #[instrument(skip(self), err)]
    async fn list(&self, book_id: &Self::Filter) -> Result<Vec<Self::Response>> {
        let chapters =
            sqlx::query_as::<_, ChapterDBResponse>("SELECT * FROM chapters WHERE book_id = $1 ORDER BY created_at, id")
                .bind(book_id)
                .fetch_all(&self.db)
                .await?;

        Ok(chapters)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM chapters WHERE id = $1").bind(id).execute(&self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let chapter = sqlx::query_as::<_, ChapterDBResponse>(
            r#"
            UPDATE chapters SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.content)
        .fetch_optional(&self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(chapter)
    }
}
