use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        extract::{PathParam, QueryParams, ValidJson},
        models::{
            books::{BookCreate, BookResponse, BookUpdate},
            pagination::{PaginatedResponse, Pagination},
            status::StatusResponse,
            users::CurrentUser,
        },
    },
    auth::permissions::AdminUser,
    db::{
        Repository,
        errors::DbError,
        models::books::{BookCreateDBRequest, BookDBResponse, BookFilter, BookUpdateDBRequest},
    },
    errors::{Error, Result},
    types::BookId,
};

fn book_not_found(id: BookId) -> Error {
    Error::NotFound {
        resource: "Book".to_string(),
        id: id.to_string(),
    }
}

/// Fetch a book or fail with 404
pub(crate) async fn fetch_book(state: &AppState, id: BookId) -> Result<BookDBResponse> {
    state.store.books().get_by_id(id).await?.ok_or_else(|| book_not_found(id))
}

#[utoipa::path(
    get,
    path = "/book",
    tag = "books",
    summary = "List books",
    params(Pagination),
    responses(
        (status = 200, description = "Paginated list of books", body = PaginatedResponse<BookResponse>),
        (status = 401, description = "Invalid or expired JWT"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_books(
    State(state): State<AppState>,
    _: CurrentUser,
    QueryParams(pagination): QueryParams<Pagination>,
) -> Result<Json<PaginatedResponse<BookResponse>>> {
    let (skip, limit) = pagination.params();
    let books = state.store.books().list(&BookFilter::new(skip, limit)).await?;
    let total_count = state.store.books().count().await?;

    Ok(Json(PaginatedResponse::new(
        books.into_iter().map(BookResponse::from).collect(),
        total_count,
        skip,
        limit,
    )))
}

#[utoipa::path(
    get,
    path = "/book/{id}",
    tag = "books",
    summary = "Get book",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book", body = BookResponse),
        (status = 401, description = "Invalid or expired JWT"),
        (status = 404, description = "Book not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_book(State(state): State<AppState>, _: CurrentUser, PathParam(id): PathParam<BookId>) -> Result<Json<BookResponse>> {
    Ok(Json(BookResponse::from(fetch_book(&state, id).await?)))
}

#[utoipa::path(
    post,
    path = "/book",
    tag = "books",
    summary = "Create book",
    request_body = BookCreate,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin privileges required"),
        (status = 409, description = "A book with this title and author already exists"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_book(
    State(state): State<AppState>,
    _: AdminUser,
    ValidJson(create): ValidJson<BookCreate>,
) -> Result<(StatusCode, Json<BookResponse>)> {
    let book = state.store.books().create(&BookCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

#[utoipa::path(
    patch,
    path = "/book/{id}",
    tag = "books",
    summary = "Update book",
    request_body = BookUpdate,
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Updated book", body = BookResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "A book with this title and author already exists"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_book(
    State(state): State<AppState>,
    _: AdminUser,
    PathParam(id): PathParam<BookId>,
    ValidJson(update): ValidJson<BookUpdate>,
) -> Result<Json<BookResponse>> {
    let book = state
        .store
        .books()
        .update(id, &BookUpdateDBRequest::from(update))
        .await
        .map_err(|e| match e {
            DbError::NotFound => book_not_found(id),
            other => other.into(),
        })?;

    Ok(Json(BookResponse::from(book)))
}

#[utoipa::path(
    delete,
    path = "/book/{id}",
    tag = "books",
    summary = "Delete book",
    description = "Deletes the book together with its chapters, quizzes and reading progress.",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = StatusResponse),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Book not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_book(State(state): State<AppState>, _: AdminUser, PathParam(id): PathParam<BookId>) -> Result<Json<StatusResponse>> {
    if !state.store.books().delete(id).await? {
        return Err(book_not_found(id));
    }
    Ok(Json(StatusResponse::success("Book deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{TestApp, bearer};
    use serde_json::{Value, json};

    fn dune() -> Value {
        json!({"title": "Dune", "author": "Frank Herbert", "published_on": "1965-08-01"})
    }

    #[test_log::test(tokio::test)]
    async fn test_admin_manages_books() {
        let app = TestApp::new().await;
        let admin = app.create_user("admin", "admin@b.com", Role::Admin).await;
        let auth = bearer(&app.access_token(&admin));

        let response = app.server.post("/api/book").add_header("authorization", auth.clone()).json(&dune()).await;
        response.assert_status(StatusCode::CREATED);
        let book: BookResponse = response.json();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.published_on.map(|d| d.to_string()).as_deref(), Some("1965-08-01"));

        let response = app.server.post("/api/book").add_header("authorization", auth.clone()).json(&dune()).await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(
            response.json::<Value>()["message"],
            "A book with this title and author already exists"
        );

        let response = app
            .server
            .patch(&format!("/api/book/{}", book.id))
            .add_header("authorization", auth.clone())
            .json(&json!({"description": "Spice"}))
            .await;
        response.assert_status_ok();
        let updated: BookResponse = response.json();
        assert_eq!(updated.description.as_deref(), Some("Spice"));
        assert_eq!(updated.title, "Dune");

        app.server
            .delete(&format!("/api/book/{}", book.id))
            .add_header("authorization", auth.clone())
            .await
            .assert_status_ok();
        app.server
            .get(&format!("/api/book/{}", book.id))
            .add_header("authorization", auth)
            .await
            .assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_users_read_but_cannot_write_books() {
        let app = TestApp::new().await;
        let alice = app.create_user("alice", "a@b.com", Role::User).await;
        let book = app.create_book("Emma", "Jane Austen").await;
        let auth = bearer(&app.access_token(&alice));

        let response = app.server.get("/api/book").add_header("authorization", auth.clone()).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["total_count"], 1);
        assert_eq!(body["data"][0]["title"], "Emma");

        app.server
            .get(&format!("/api/book/{}", book.id))
            .add_header("authorization", auth.clone())
            .await
            .assert_status_ok();

        let response = app.server.post("/api/book").add_header("authorization", auth.clone()).json(&dune()).await;
        response.assert_status_forbidden();
        assert_eq!(response.json::<Value>()["message"], "Access denied: admin privileges required");

        app.server
            .delete(&format!("/api/book/{}", book.id))
            .add_header("authorization", auth)
            .await
            .assert_status_forbidden();

        // Unauthenticated reads are rejected before anything else
        app.server.get("/api/book").await.assert_status_bad_request();
    }

    #[test_log::test(tokio::test)]
    async fn test_invalid_book_input() {
        let app = TestApp::new().await;
        let admin = app.create_user("admin", "admin@b.com", Role::Admin).await;
        let auth = bearer(&app.access_token(&admin));

        app.server
            .post("/api/book")
            .add_header("authorization", auth.clone())
            .json(&json!({"title": "", "author": "Nobody"}))
            .await
            .assert_status_bad_request();

        app.server
            .post("/api/book")
            .add_header("authorization", auth.clone())
            .json(&json!({"title": "T", "author": "A", "description": "x".repeat(256)}))
            .await
            .assert_status_bad_request();

        app.server
            .get("/api/book/not-a-number")
            .add_header("authorization", auth)
            .await
            .assert_status_bad_request();
    }

    #[test_log::test(tokio::test)]
    async fn test_authentication_precedes_path_and_query_parsing() {
        let app = TestApp::new().await;
        let alice = app.create_user("alice", "a@b.com", Role::User).await;
        let garbage = bearer("garbage.token.value");

        let response = app.server.get("/api/book/abc").add_header("authorization", garbage.clone()).await;
        response.assert_status_unauthorized();
        assert_eq!(response.json::<Value>(), json!({"status": "error", "message": "Invalid or expired JWT"}));

        app.server
            .get("/api/book?limit=lots")
            .add_header("authorization", garbage)
            .await
            .assert_status_unauthorized();

        // Role checks also run before the path is parsed
        app.server
            .delete("/api/book/abc")
            .add_header("authorization", bearer(&app.access_token(&alice)))
            .await
            .assert_status_forbidden();

        let auth = bearer(&app.access_token(&alice));
        let response = app.server.get("/api/book/abc").add_header("authorization", auth.clone()).await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["status"], "error");

        let response = app.server.get("/api/book?limit=lots").add_header("authorization", auth).await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["status"], "error");
    }
}
