//! Database repository for books.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::{BookRepository, Repository},
        models::books::{BookCreateDBRequest, BookDBResponse, BookFilter, BookUpdateDBRequest},
    },
    types::BookId,
};
use sqlx::PgPool;
use tracing::instrument;

pub struct Books {
    db: PgPool,
}

impl Books {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Repository for Books {
    type CreateRequest = BookCreateDBRequest;
    type UpdateRequest = BookUpdateDBRequest;
    type Response = BookDBResponse;
    type Id = BookId;
    type Filter = BookFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let book = sqlx::query_as::<_, BookDBResponse>(
            r#"
            INSERT INTO books (title, author, description, published_on)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.title)
        .bind(&request.author)
        .bind(&request.description)
        .bind(request.published_on)
        .fetch_one(&self.db)
        .await?;

        Ok(book)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        let book = sqlx::query_as::<_, BookDBResponse>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(book)
    }

    #[instrument(skip(self, filter), fields(skip = filter.skip, limit = filter.limit), err)]
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let books = sqlx::query_as::<_, BookDBResponse>("SELECT * FROM books ORDER BY id LIMIT $1 OFFSET $2")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&self.db)
            .await?;

        Ok(books)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1").bind(id).execute(&self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let book = sqlx::query_as::<_, BookDBResponse>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                description = COALESCE($4, description),
                published_on = COALESCE($5, published_on),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.author)
        .bind(&request.description)
        .bind(request.published_on)
        .fetch_optional(&self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(book)
    }
}

#[async_trait::async_trait]
impl BookRepository for Books {
    #[instrument(skip(self), err)]
    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books").fetch_one(&self.db).await?;
        Ok(count)
    }
}
