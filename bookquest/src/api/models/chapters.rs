//! API request/response models for chapters.

use crate::db::models::chapters::ChapterDBResponse;
use crate::types::{BookId, ChapterId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChapterCreate {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChapterUpdate {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChapterResponse {
    pub id: ChapterId,
    pub book_id: BookId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChapterDBResponse> for ChapterResponse {
    fn from(db: ChapterDBResponse) -> Self {
        Self {
            id: db.id,
            book_id: db.book_id,
            title: db.title,
            content: db.content,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
