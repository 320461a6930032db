//! Repository traits for database operations.
//!
//! A repository is a data access layer for one table (plus its child tables). It provides
//! methods for creating, reading, updating, and deleting entities, as well as listing them with
//! simple filters. The traits are object safe so that handlers can work against any storage
//! backend through [`crate::db::Store`].

use crate::db::errors::Result;
use crate::db::models::{
    books::{BookCreateDBRequest, BookDBResponse, BookFilter, BookUpdateDBRequest},
    chapters::{ChapterCreateDBRequest, ChapterDBResponse, ChapterUpdateDBRequest},
    progress::{ProgressDBResponse, ProgressUpsertDBRequest},
    quizzes::{QuizCreateDBRequest, QuizDBResponse},
    users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest},
};
use crate::types::{BookId, ChapterId, QuizId, UserId};

/// Base repository trait providing common database operations
///
/// This trait has separate associated types for create requests, update requests, and responses.
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    /// The request type for creating entities
    type CreateRequest: Sync;

    /// The request type for updating entities
    type UpdateRequest: Sync;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// List entities with filtering and pagination
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Delete an entity by ID
    async fn delete(&self, id: Self::Id) -> Result<bool>;

    /// Update an entity by ID. Fails with [`DbError::NotFound`](crate::db::errors::DbError::NotFound)
    /// if it does not exist.
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}

/// Credential store: user accounts keyed by id, email and username.
///
/// Username and email are each unique; a duplicate create fails with a unique violation on
/// `users_username_key` or `users_email_key`. Deleting a user deletes their progress.
#[async_trait::async_trait]
pub trait UserRepository:
    Repository<
        CreateRequest = UserCreateDBRequest,
        UpdateRequest = UserUpdateDBRequest,
        Response = UserDBResponse,
        Id = UserId,
        Filter = UserFilter,
    >
{
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserDBResponse>>;

    async fn count(&self) -> Result<i64>;
}

/// Books are unique by (title, author). Deleting a book deletes its chapters, quizzes and any
/// progress recorded against it.
#[async_trait::async_trait]
pub trait BookRepository:
    Repository<
        CreateRequest = BookCreateDBRequest,
        UpdateRequest = BookUpdateDBRequest,
        Response = BookDBResponse,
        Id = BookId,
        Filter = BookFilter,
    >
{
    async fn count(&self) -> Result<i64>;
}

/// Chapters, listed per book in creation order.
pub trait ChapterRepository:
    Repository<
        CreateRequest = ChapterCreateDBRequest,
        UpdateRequest = ChapterUpdateDBRequest,
        Response = ChapterDBResponse,
        Id = ChapterId,
        Filter = BookId,
    >
{
}

impl<T> ChapterRepository for T where
    T: Repository<
            CreateRequest = ChapterCreateDBRequest,
            UpdateRequest = ChapterUpdateDBRequest,
            Response = ChapterDBResponse,
            Id = ChapterId,
            Filter = BookId,
        >
{
}

/// Quizzes with their questions. At most one quiz per chapter (`quizzes_chapter_id_key`).
#[async_trait::async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create(&self, request: &QuizCreateDBRequest) -> Result<QuizDBResponse>;

    async fn get_by_id(&self, id: QuizId) -> Result<Option<QuizDBResponse>>;

    async fn get_by_chapter(&self, chapter_id: ChapterId) -> Result<Option<QuizDBResponse>>;

    async fn delete(&self, id: QuizId) -> Result<bool>;
}

/// Per-user chapter completion, one row per (user, chapter).
#[async_trait::async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn upsert(&self, request: &ProgressUpsertDBRequest) -> Result<ProgressDBResponse>;

    /// All entries for a user, ordered by book then chapter
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ProgressDBResponse>>;
}
