use axum::{Json, extract::State};

use crate::{
    AppState,
    api::{
        extract::ValidJson,
        handlers::chapters::fetch_chapter,
        models::progress::{ProgressResponse, ProgressUpdate},
    },
    auth::permissions::OwnerOrAdmin,
    db::models::progress::ProgressUpsertDBRequest,
    errors::Result,
};

#[utoipa::path(
    get,
    path = "/user/{id}/progress",
    tag = "progress",
    summary = "Get reading progress",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Progress entries, ordered by book then chapter", body = Vec<ProgressResponse>),
        (status = 400, description = "Invalid user ID"),
        (status = 403, description = "Not the owner or an admin"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_progress(State(state): State<AppState>, access: OwnerOrAdmin) -> Result<Json<Vec<ProgressResponse>>> {
    let entries = state.store.progress().list_for_user(access.target).await?;
    Ok(Json(entries.into_iter().map(ProgressResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/user/{id}/progress",
    tag = "progress",
    summary = "Record reading progress",
    request_body = ProgressUpdate,
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Stored progress entry", body = ProgressResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "Chapter not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn put_progress(
    State(state): State<AppState>,
    access: OwnerOrAdmin,
    ValidJson(update): ValidJson<ProgressUpdate>,
) -> Result<Json<ProgressResponse>> {
    let chapter = fetch_chapter(&state, update.chapter_id).await?;

    let entry = state
        .store
        .progress()
        .upsert(&ProgressUpsertDBRequest {
            user_id: access.target,
            book_id: chapter.book_id,
            chapter_id: chapter.id,
            completed: update.completed,
        })
        .await?;

    Ok(Json(ProgressResponse::from(entry)))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{TestApp, bearer};
    use serde_json::{Value, json};

    #[test_log::test(tokio::test)]
    async fn test_progress_upsert_is_per_user_and_chapter() {
        let app = TestApp::new().await;
        let alice = app.create_user("alice", "a@b.com", Role::User).await;
        let book = app.create_book("Dune", "Frank Herbert").await;
        let one = app.create_chapter(book.id, "One").await;
        let two = app.create_chapter(book.id, "Two").await;
        let path = format!("/api/user/{}/progress", alice.id);
        let auth = bearer(&app.access_token(&alice));

        for (chapter_id, completed) in [(two.id, true), (one.id, false), (one.id, true)] {
            app.server
                .put(&path)
                .add_header("authorization", auth.clone())
                .json(&json!({"chapter_id": chapter_id, "completed": completed}))
                .await
                .assert_status_ok();
        }

        let response = app.server.get(&path).add_header("authorization", auth).await;
        response.assert_status_ok();
        let entries: Vec<Value> = response.json();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["chapter_id"], one.id);
        assert_eq!(entries[0]["book_id"], book.id);
        assert_eq!(entries[0]["completed"], true);
        assert_eq!(entries[1]["chapter_id"], two.id);
    }

    #[test_log::test(tokio::test)]
    async fn test_progress_guards() {
        let app = TestApp::new().await;
        let alice = app.create_user("alice", "a@b.com", Role::User).await;
        let bob = app.create_user("bob", "bob@b.com", Role::User).await;
        let path = format!("/api/user/{}/progress", alice.id);

        app.server
            .get(&path)
            .add_header("authorization", bearer(&app.access_token(&bob)))
            .await
            .assert_status_forbidden();

        app.server
            .put(&path)
            .add_header("authorization", bearer(&app.access_token(&alice)))
            .json(&json!({"chapter_id": 12345, "completed": true}))
            .await
            .assert_status_not_found();
    }
}
