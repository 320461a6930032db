//! API request/response models for chapter quizzes.

use crate::db::models::quizzes::{QuestionDBResponse, QuizDBResponse};
use crate::types::{BookId, ChapterId, QuestionId, QuizId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuestionCreate {
    #[validate(length(min = 1, message = "Question text is required"))]
    pub text: String,
    #[validate(length(min = 1, max = 255, message = "Answer must be between 1 and 255 characters"))]
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuizCreate {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "A quiz needs at least one question"), nested)]
    pub questions: Vec<QuestionCreate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionResponse {
    pub id: QuestionId,
    pub position: i32,
    pub text: String,
    /// Only included for admins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizResponse {
    pub id: QuizId,
    pub book_id: BookId,
    pub chapter_id: ChapterId,
    pub title: String,
    pub questions: Vec<QuestionResponse>,
    pub created_at: DateTime<Utc>,
}

impl QuizResponse {
    /// Build a response, revealing answers only when `with_answers` is set
    pub fn from_db(db: QuizDBResponse, with_answers: bool) -> Self {
        Self {
            id: db.id,
            book_id: db.book_id,
            chapter_id: db.chapter_id,
            title: db.title,
            questions: db
                .questions
                .into_iter()
                .map(|q: QuestionDBResponse| QuestionResponse {
                    id: q.id,
                    position: q.position,
                    text: q.text,
                    answer: with_answers.then_some(q.answer),
                })
                .collect(),
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuizSubmission {
    #[validate(nested)]
    pub answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuestionResult {
    pub question_id: QuestionId,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuizResult {
    pub total_questions: usize,
    pub correct_questions: usize,
    pub is_perfect: bool,
    pub question_results: Vec<QuestionResult>,
}
