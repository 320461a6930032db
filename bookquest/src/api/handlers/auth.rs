use axum::{Json, extract::State};

use crate::{
    AppState,
    api::{
        extract::ValidJson,
        models::auth::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse},
    },
    auth::flow,
    errors::Error,
};

/// Log in with an email address or username
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid identity or password"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, ValidJson(request): ValidJson<LoginRequest>) -> Result<Json<LoginResponse>, Error> {
    let response = flow::login(state.store.as_ref(), &state.hasher, &state.tokens, request).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/token/refresh",
    request_body = RefreshRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid refresh token"),
        (status = 404, description = "User no longer exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, Error> {
    let response = flow::refresh(state.store.as_ref(), &state.tokens, &request.refresh_token).await?;
    Ok(Json(response))
}
