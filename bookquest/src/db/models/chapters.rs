//! Database models for chapters.

use crate::types::{BookId, ChapterId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ChapterCreateDBRequest {
    pub book_id: BookId,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChapterUpdateDBRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChapterDBResponse {
    pub id: ChapterId,
    pub book_id: BookId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
