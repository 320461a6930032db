//! Database repository for quizzes and their questions.

use crate::{
    db::{
        errors::Result,
        handlers::repository::QuizRepository,
        models::quizzes::{QuestionDBResponse, QuizCreateDBRequest, QuizDBResponse},
    },
    types::{BookId, ChapterId, QuizId},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::instrument;

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Quiz {
    pub id: QuizId,
    pub book_id: BookId,
    pub chapter_id: ChapterId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<(Quiz, Vec<QuestionDBResponse>)> for QuizDBResponse {
    fn from((quiz, questions): (Quiz, Vec<QuestionDBResponse>)) -> Self {
        Self {
            id: quiz.id,
            book_id: quiz.book_id,
            chapter_id: quiz.chapter_id,
            title: quiz.title,
            questions,
            created_at: quiz.created_at,
        }
    }
}

pub struct Quizzes {
    db: PgPool,
}

impl Quizzes {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn questions_for(conn: &mut PgConnection, quiz_id: QuizId) -> Result<Vec<QuestionDBResponse>> {
        let questions = sqlx::query_as::<_, QuestionDBResponse>("SELECT * FROM questions WHERE quiz_id = $1 ORDER BY position")
            .bind(quiz_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(questions)
    }

    async fn load(&self, quiz: Option<Quiz>) -> Result<Option<QuizDBResponse>> {
        let Some(quiz) = quiz else {
            return Ok(None);
        };

        let mut conn = self.db.acquire().await?;
        let questions = Self::questions_for(&mut conn, quiz.id).await?;
        Ok(Some(QuizDBResponse::from((quiz, questions))))
    }
}

#[async_trait::async_trait]
impl QuizRepository for Quizzes {
    #[instrument(skip(self, request), fields(chapter_id = request.chapter_id, questions = request.questions.len()), err)]
    async fn create(&self, request: &QuizCreateDBRequest) -> Result<QuizDBResponse> {
        let mut tx = self.db.begin().await?;

        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (book_id, chapter_id, title)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(request.book_id)
        .bind(request.chapter_id)
        .bind(&request.title)
        .fetch_one(&mut *tx)
        .await?;

        for (index, question) in request.questions.iter().enumerate() {
            sqlx::query("INSERT INTO questions (quiz_id, position, text, answer) VALUES ($1, $2, $3, $4)")
                .bind(quiz.id)
                .bind(index as i32 + 1)
                .bind(&question.text)
                .bind(&question.answer)
                .execute(&mut *tx)
                .await?;
        }

        let questions = Self::questions_for(&mut tx, quiz.id).await?;
        tx.commit().await?;

        Ok(QuizDBResponse::from((quiz, questions)))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&self, id: QuizId) -> Result<Option<QuizDBResponse>> {
        let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        self.load(quiz).await
    }

    #[instrument(skip(self), err)]
    async fn get_by_chapter(&self, chapter_id: ChapterId) -> Result<Option<QuizDBResponse>> {
        let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE chapter_id = $1")
            .bind(chapter_id)
            .fetch_optional(&self.db)
            .await?;

        self.load(quiz).await
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: QuizId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1").bind(id).execute(&self.db).await?;

        Ok(result.rows_affected() > 0)
    }
}
