use std::collections::HashMap;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        extract::{PathParam, ValidJson},
        handlers::chapters::fetch_chapter,
        models::{
            quizzes::{QuestionResult, QuizCreate, QuizResponse, QuizResult, QuizSubmission},
            status::StatusResponse,
            users::CurrentUser,
        },
    },
    auth::permissions::AdminUser,
    db::models::{
        progress::ProgressUpsertDBRequest,
        quizzes::{QuestionCreateDBRequest, QuizCreateDBRequest, QuizDBResponse},
    },
    errors::{Error, Result},
    types::{ChapterId, QuestionId, QuizId},
};

fn quiz_not_found(id: QuizId) -> Error {
    Error::NotFound {
        resource: "Quiz".to_string(),
        id: id.to_string(),
    }
}

async fn fetch_quiz(state: &AppState, id: QuizId) -> Result<QuizDBResponse> {
    state.store.quizzes().get_by_id(id).await?.ok_or_else(|| quiz_not_found(id))
}

fn answers_match(given: &str, expected: &str) -> bool {
    given.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// Grade a submission against a quiz.
///
/// Answers are compared after trimming, ignoring case. Questions left unanswered count as wrong;
/// answers naming a question that is not part of the quiz are rejected.
pub fn grade(quiz: &QuizDBResponse, submission: &QuizSubmission) -> Result<QuizResult> {
    let mut answers: HashMap<QuestionId, &str> = HashMap::with_capacity(submission.answers.len());
    for answer in &submission.answers {
        if !quiz.questions.iter().any(|q| q.id == answer.question_id) {
            return Err(Error::BadRequest {
                message: format!("Question {} is not part of quiz {}", answer.question_id, quiz.id),
            });
        }
        answers.insert(answer.question_id, answer.answer.as_str());
    }

    let question_results: Vec<QuestionResult> = quiz
        .questions
        .iter()
        .map(|question| QuestionResult {
            question_id: question.id,
            correct: answers
                .get(&question.id)
                .is_some_and(|given| answers_match(given, &question.answer)),
        })
        .collect();

    let total_questions = question_results.len();
    let correct_questions = question_results.iter().filter(|r| r.correct).count();

    Ok(QuizResult {
        total_questions,
        correct_questions,
        is_perfect: total_questions > 0 && correct_questions == total_questions,
        question_results,
    })
}

#[utoipa::path(
    post,
    path = "/chapters/{chapter_id}/quiz",
    tag = "quizzes",
    summary = "Create the quiz for a chapter",
    request_body = QuizCreate,
    params(("chapter_id" = i64, Path, description = "Chapter ID")),
    responses(
        (status = 201, description = "Quiz created", body = QuizResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Chapter not found"),
        (status = 409, description = "This chapter already has a quiz"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_quiz(
    State(state): State<AppState>,
    _: AdminUser,
    PathParam(chapter_id): PathParam<ChapterId>,
    ValidJson(create): ValidJson<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>)> {
    let chapter = fetch_chapter(&state, chapter_id).await?;

    let request = QuizCreateDBRequest {
        book_id: chapter.book_id,
        chapter_id,
        title: create.title,
        questions: create
            .questions
            .into_iter()
            .map(|q| QuestionCreateDBRequest {
                text: q.text,
                answer: q.answer,
            })
            .collect(),
    };
    let quiz = state.store.quizzes().create(&request).await?;

    Ok((StatusCode::CREATED, Json(QuizResponse::from_db(quiz, true))))
}

#[utoipa::path(
    get,
    path = "/chapters/{chapter_id}/quiz",
    tag = "quizzes",
    summary = "Get the quiz of a chapter",
    params(("chapter_id" = i64, Path, description = "Chapter ID")),
    responses(
        (status = 200, description = "Quiz without answers", body = QuizResponse),
        (status = 401, description = "Invalid or expired JWT"),
        (status = 404, description = "Chapter has no quiz"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_chapter_quiz(
    State(state): State<AppState>,
    _: CurrentUser,
    PathParam(chapter_id): PathParam<ChapterId>,
) -> Result<Json<QuizResponse>> {
    let quiz = state
        .store
        .quizzes()
        .get_by_chapter(chapter_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Quiz for chapter".to_string(),
            id: chapter_id.to_string(),
        })?;

    Ok(Json(QuizResponse::from_db(quiz, false)))
}

#[utoipa::path(
    get,
    path = "/quizzes/{quiz_id}",
    tag = "quizzes",
    summary = "Get quiz",
    description = "Answers are only included for admins.",
    params(("quiz_id" = i64, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Quiz", body = QuizResponse),
        (status = 401, description = "Invalid or expired JWT"),
        (status = 404, description = "Quiz not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_quiz(
    State(state): State<AppState>,
    current_user: CurrentUser,
    PathParam(quiz_id): PathParam<QuizId>,
) -> Result<Json<QuizResponse>> {
    let quiz = fetch_quiz(&state, quiz_id).await?;
    Ok(Json(QuizResponse::from_db(quiz, current_user.is_admin())))
}

#[utoipa::path(
    delete,
    path = "/quizzes/{quiz_id}",
    tag = "quizzes",
    summary = "Delete quiz",
    params(("quiz_id" = i64, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Quiz deleted", body = StatusResponse),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Quiz not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_quiz(State(state): State<AppState>, _: AdminUser, PathParam(quiz_id): PathParam<QuizId>) -> Result<Json<StatusResponse>> {
    if !state.store.quizzes().delete(quiz_id).await? {
        return Err(quiz_not_found(quiz_id));
    }
    Ok(Json(StatusResponse::success("Quiz deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/quizzes/{quiz_id}/submit",
    tag = "quizzes",
    summary = "Submit quiz answers",
    description = "A perfect score marks the quiz's chapter as completed for the caller.",
    request_body = QuizSubmission,
    params(("quiz_id" = i64, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Graded result", body = QuizResult),
        (status = 400, description = "Invalid input or unknown question"),
        (status = 401, description = "Invalid or expired JWT"),
        (status = 404, description = "Quiz not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn submit_quiz(
    State(state): State<AppState>,
    current_user: CurrentUser,
    PathParam(quiz_id): PathParam<QuizId>,
    ValidJson(submission): ValidJson<QuizSubmission>,
) -> Result<Json<QuizResult>> {
    let quiz = fetch_quiz(&state, quiz_id).await?;
    let result = grade(&quiz, &submission)?;

    if result.is_perfect {
        state
            .store
            .progress()
            .upsert(&ProgressUpsertDBRequest {
                user_id: current_user.id,
                book_id: quiz.book_id,
                chapter_id: quiz.chapter_id,
                completed: true,
            })
            .await?;
        tracing::info!(user_id = current_user.id, chapter_id = quiz.chapter_id, "Chapter completed by quiz");
    }

    Ok(Json(result))
}
