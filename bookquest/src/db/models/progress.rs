//! Database models for per-user chapter progress.

use crate::types::{BookId, ChapterId, UserId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ProgressUpsertDBRequest {
    pub user_id: UserId,
    pub book_id: BookId,
    pub chapter_id: ChapterId,
    pub completed: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProgressDBResponse {
    pub user_id: UserId,
    pub book_id: BookId,
    pub chapter_id: ChapterId,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}
