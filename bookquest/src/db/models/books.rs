//! Database models for books.

use crate::api::models::books::{BookCreate, BookUpdate};
use crate::types::BookId;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone)]
pub struct BookCreateDBRequest {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub published_on: Option<NaiveDate>,
}

impl From<BookCreate> for BookCreateDBRequest {
    fn from(api: BookCreate) -> Self {
        Self {
            title: api.title,
            author: api.author,
            description: api.description,
            published_on: api.published_on,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookUpdateDBRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published_on: Option<NaiveDate>,
}

impl From<BookUpdate> for BookUpdateDBRequest {
    fn from(api: BookUpdate) -> Self {
        Self {
            title: api.title,
            author: api.author,
            description: api.description,
            published_on: api.published_on,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookDBResponse {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub published_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BookFilter {
    pub skip: i64,
    pub limit: i64,
}

impl BookFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}
