//! Database models for quizzes and their questions.

use crate::types::{BookId, ChapterId, QuestionId, QuizId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct QuestionCreateDBRequest {
    pub text: String,
    pub answer: String,
}

#[derive(Debug, Clone)]
pub struct QuizCreateDBRequest {
    pub book_id: BookId,
    pub chapter_id: ChapterId,
    pub title: String,
    /// Stored in order; positions are assigned from 1
    pub questions: Vec<QuestionCreateDBRequest>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuestionDBResponse {
    pub id: QuestionId,
    pub quiz_id: QuizId,
    pub position: i32,
    pub text: String,
    pub answer: String,
}

#[derive(Debug, Clone)]
pub struct QuizDBResponse {
    pub id: QuizId,
    pub book_id: BookId,
    pub chapter_id: ChapterId,
    pub title: String,
    /// Ordered by position
    pub questions: Vec<QuestionDBResponse>,
    pub created_at: DateTime<Utc>,
}
