use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        extract::{PathParam, ValidJson},
        handlers::books::fetch_book,
        models::{
            chapters::{ChapterCreate, ChapterResponse, ChapterUpdate},
            status::StatusResponse,
            users::CurrentUser,
        },
    },
    auth::permissions::AdminUser,
    db::{
        Repository,
        errors::DbError,
        models::chapters::{ChapterCreateDBRequest, ChapterDBResponse, ChapterUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{BookId, ChapterId},
};

fn chapter_not_found(id: ChapterId) -> Error {
    Error::NotFound {
        resource: "Chapter".to_string(),
        id: id.to_string(),
    }
}

/// Fetch a chapter or fail with 404
pub(crate) async fn fetch_chapter(state: &AppState, id: ChapterId) -> Result<ChapterDBResponse> {
    state.store.chapters().get_by_id(id).await?.ok_or_else(|| chapter_not_found(id))
}

#[utoipa::path(
    post,
    path = "/books/{book_id}/chapters",
    tag = "chapters",
    summary = "Add chapter",
    request_body = ChapterCreate,
    params(("book_id" = i64, Path, description = "Book ID")),
    responses(
        (status = 201, description = "Chapter created", body = ChapterResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Book not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_chapter(
    State(state): State<AppState>,
    _: AdminUser,
    PathParam(book_id): PathParam<BookId>,
    ValidJson(create): ValidJson<ChapterCreate>,
) -> Result<(StatusCode, Json<ChapterResponse>)> {
    fetch_book(&state, book_id).await?;

    let chapter = state
        .store
        .chapters()
        .create(&ChapterCreateDBRequest {
            book_id,
            title: create.title,
            content: create.content,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ChapterResponse::from(chapter))))
}

#[utoipa::path(
    get,
    path = "/books/{book_id}/chapters",
    tag = "chapters",
    summary = "List chapters of a book",
    params(("book_id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Chapters in creation order", body = Vec<ChapterResponse>),
        (status = 401, description = "Invalid or expired JWT"),
        (status = 404, description = "Book not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_chapters(
    State(state): State<AppState>,
    _: CurrentUser,
    PathParam(book_id): PathParam<BookId>,
) -> Result<Json<Vec<ChapterResponse>>> {
    fetch_book(&state, book_id).await?;

    let chapters = state.store.chapters().list(&book_id).await?;
    Ok(Json(chapters.into_iter().map(ChapterResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/chapters/{chapter_id}",
    tag = "chapters",
    summary = "Get chapter",
    params(("chapter_id" = i64, Path, description = "Chapter ID")),
    responses(
        (status = 200, description = "Chapter", body = ChapterResponse),
        (status = 401, description = "Invalid or expired JWT"),
        (status = 404, description = "Chapter not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_chapter(
    State(state): State<AppState>,
    _: CurrentUser,
    PathParam(chapter_id): PathParam<ChapterId>,
) -> Result<Json<ChapterResponse>> {
    Ok(Json(ChapterResponse::from(fetch_chapter(&state, chapter_id).await?)))
}

#[utoipa::path(
    put,
    path = "/chapters/{chapter_id}",
    tag = "chapters",
    summary = "Update chapter",
    request_body = ChapterUpdate,
    params(("chapter_id" = i64, Path, description = "Chapter ID")),
    responses(
        (status = 200, description = "Updated chapter", body = ChapterResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Chapter not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_chapter(
    State(state): State<AppState>,
    _: AdminUser,
    PathParam(chapter_id): PathParam<ChapterId>,
    ValidJson(update): ValidJson<ChapterUpdate>,
) -> Result<Json<ChapterResponse>> {
    let chapter = state
        .store
        .chapters()
        .update(
            chapter_id,
            &ChapterUpdateDBRequest {
                title: update.title,
                content: update.content,
            },
        )
        .await
        .map_err(|e| match e {
            DbError::NotFound => chapter_not_found(chapter_id),
            other => other.into(),
        })?;

    Ok(Json(ChapterResponse::from(chapter)))
}

#[utoipa::path(
    delete,
    path = "/chapters/{chapter_id}",
    tag = "chapters",
    summary = "Delete chapter",
    params(("chapter_id" = i64, Path, description = "Chapter ID")),
    responses(
        (status = 200, description = "Chapter deleted successfully", body = StatusResponse),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Chapter not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_chapter(
    State(state): State<AppState>,
    _: AdminUser,
    PathParam(chapter_id): PathParam<ChapterId>,
) -> Result<Json<StatusResponse>> {
    if !state.store.chapters().delete(chapter_id).await? {
        return Err(chapter_not_found(chapter_id));
    }
    Ok(Json(StatusResponse::success("Chapter deleted successfully")))
}
