//! API request/response models for reading progress.

use crate::db::models::progress::ProgressDBResponse;
use crate::types::{BookId, ChapterId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProgressUpdate {
    pub chapter_id: ChapterId,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgressResponse {
    pub user_id: UserId,
    pub book_id: BookId,
    pub chapter_id: ChapterId,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<ProgressDBResponse> for ProgressResponse {
    fn from(db: ProgressDBResponse) -> Self {
        Self {
            user_id: db.user_id,
            book_id: db.book_id,
            chapter_id: db.chapter_id,
            completed: db.completed,
            updated_at: db.updated_at,
        }
    }
}
