use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        extract::{QueryParams, ValidJson},
        models::{
            pagination::{PaginatedResponse, Pagination},
            status::StatusResponse,
            users::{CurrentUser, RegisterResponse, RegisteredUser, Role, UserDelete, UserRegister, UserResponse, UserUpdate},
        },
    },
    auth::permissions::{AdminUser, OwnerOrAdmin, require_admin},
    config::PasswordConfig,
    db::{
        Repository,
        errors::DbError,
        models::users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{Operation, UserId},
};

/// Enforce the configured password length: `min_length` characters, `max_length` bytes.
pub fn check_password_length(password: &str, config: &PasswordConfig) -> Result<()> {
    if password.chars().count() < config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", config.min_length),
        });
    }
    if password.len() > config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at most {} bytes", config.max_length),
        });
    }
    Ok(())
}

async fn fetch_user(state: &AppState, id: UserId) -> Result<UserDBResponse> {
    state.store.users().get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/user/register",
    request_body = UserRegister,
    tag = "users",
    responses(
        (status = 201, description = "User created successfully", body = RegisterResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or username already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<UserRegister>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    check_password_length(&request.password, &state.config.auth.password)?;

    let password_hash = state.hasher.hash(request.password).await?;
    let created = state
        .store
        .users()
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email,
            password_hash,
            names: request.names,
            role: Role::User,
        })
        .await?;
    tracing::info!(user_id = created.id, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            status: "success".to_string(),
            message: "User created successfully".to_string(),
            data: RegisteredUser {
                email: created.email,
                username: created.username,
            },
        }),
    ))
}

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/user/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 400, description = "Missing or malformed JWT"),
        (status = 401, description = "Invalid or expired JWT"),
        (status = 404, description = "User no longer exists"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>> {
    let user = fetch_user(&state, current_user.id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// List users
#[utoipa::path(
    get,
    path = "/user",
    tag = "users",
    params(Pagination),
    responses(
        (status = 200, description = "Paginated list of users", body = PaginatedResponse<UserResponse>),
        (status = 401, description = "Invalid or expired JWT"),
        (status = 403, description = "Admin privileges required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _: AdminUser,
    QueryParams(pagination): QueryParams<Pagination>,
) -> Result<Json<PaginatedResponse<UserResponse>>> {
    let (skip, limit) = pagination.params();
    let users = state.store.users().list(&UserFilter::new(skip, limit)).await?;
    let total_count = state.store.users().count().await?;

    Ok(Json(PaginatedResponse::new(
        users.into_iter().map(UserResponse::from).collect(),
        total_count,
        skip,
        limit,
    )))
}

/// Get a user
#[utoipa::path(
    get,
    path = "/user/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Invalid user ID"),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(State(state): State<AppState>, access: OwnerOrAdmin) -> Result<Json<UserResponse>> {
    let user = fetch_user(&state, access.target).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update a user's profile, or role for admins
#[utoipa::path(
    patch,
    path = "/user/{id}",
    tag = "users",
    request_body = UserUpdate,
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not the owner or an admin, or a role change by a non-admin"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    access: OwnerOrAdmin,
    ValidJson(update): ValidJson<UserUpdate>,
) -> Result<Json<UserResponse>> {
    if update.role.is_some() {
        require_admin(&access.user, Operation::Update, "user role")?;
    }

    let user = state
        .store
        .users()
        .update(access.target, &UserUpdateDBRequest::new(update))
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::NotFound {
                resource: "User".to_string(),
                id: access.target.to_string(),
            },
            other => other.into(),
        })?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete a user
///
/// Deleting your own account requires your password. Admins deleting someone else's account do
/// not send a body.
#[utoipa::path(
    delete,
    path = "/user/{id}",
    tag = "users",
    request_body(content = UserDelete, description = "Required when deleting your own account"),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted successfully", body = StatusResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Wrong password"),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(State(state): State<AppState>, access: OwnerOrAdmin, body: Bytes) -> Result<Json<StatusResponse>> {
    let user = fetch_user(&state, access.target).await?;

    if access.user.id == access.target {
        if body.is_empty() {
            return Err(Error::BadRequest {
                message: "Password is required to delete your own account".to_string(),
            });
        }
        let confirmation: UserDelete = serde_json::from_slice(&body).map_err(|e| Error::BadRequest {
            message: format!("Failed to parse the request body as JSON: {e}"),
        })?;

        if !state.hasher.verify(confirmation.password, user.password_hash).await? {
            return Err(Error::InvalidCredentials);
        }
    }

    if !state.store.users().delete(access.target).await? {
        return Err(Error::NotFound {
            resource: "User".to_string(),
            id: access.target.to_string(),
        });
    }
    tracing::info!(user_id = access.target, deleted_by = access.user.id, "Deleted user");

    Ok(Json(StatusResponse::success("User deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestApp, bearer};
    use serde_json::{Value, json};

    #[test]
    fn test_password_length_rules() {
        let config = PasswordConfig::default();
        assert!(check_password_length("longenough1", &config).is_ok());
        assert!(check_password_length("short", &config).is_err());
        assert!(check_password_length(&"a".repeat(72), &config).is_ok());
        assert!(check_password_length(&"a".repeat(73), &config).is_err());
        // 8 characters but 16 bytes
        assert!(check_password_length("éééééééé", &config).is_ok());
    }

    #[test_log::test(tokio::test)]
    async fn test_register_then_login() {
        let app = TestApp::new().await;

        let response = app
            .server
            .post("/api/user/register")
            .json(&json!({"username": "alice", "email": "a@b.com", "password": "longenough1"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "User created successfully");
        assert_eq!(body["data"], json!({"email": "a@b.com", "username": "alice"}));
        assert!(!response.text().contains("longenough1"));
        assert!(!response.text().contains("password"));

        let stored = app.store.users().get_user_by_username("alice").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "longenough1");
        assert!(stored.password_hash.starts_with("$2b$04$"));

        let login = app
            .server
            .post("/api/auth/login")
            .json(&json!({"identity": "alice", "password": "longenough1"}))
            .await;
        login.assert_status_ok();
        let body: Value = login.json();
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["role"], "user");
        assert!(body["user"].get("password_hash").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_register_conflicts_and_validation() {
        let app = TestApp::new().await;
        app.create_user("alice", "a@b.com", Role::User).await;

        let response = app
            .server
            .post("/api/user/register")
            .json(&json!({"username": "bob", "email": "a@b.com", "password": "longenough1"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["message"], "Email already exists");

        let response = app
            .server
            .post("/api/user/register")
            .json(&json!({"username": "alice", "email": "other@b.com", "password": "longenough1"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["message"], "Username already exists");

        let response = app
            .server
            .post("/api/user/register")
            .json(&json!({"username": "carol", "email": "c@b.com", "password": "short"}))
            .await;
        response.assert_status_bad_request();

        let response = app
            .server
            .post("/api/user/register")
            .json(&json!({"username": "carol", "email": "c@b.com", "password": "a".repeat(73)}))
            .await;
        response.assert_status_bad_request();
    }

    #[test_log::test(tokio::test)]
    async fn test_me_requires_bearer_token() {
        let app = TestApp::new().await;
        let alice = app.create_user("alice", "a@b.com", Role::User).await;

        app.server.get("/api/user/me").await.assert_status_bad_request();

        let response = app
            .server
            .get("/api/user/me")
            .add_header("authorization", "Bearer not.a.token")
            .await;
        response.assert_status_unauthorized();
        assert_eq!(response.json::<Value>()["message"], "Invalid or expired JWT");

        let response = app
            .server
            .get("/api/user/me")
            .add_header("authorization", bearer(&app.access_token(&alice)))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["username"], "alice");
    }

    #[test_log::test(tokio::test)]
    async fn test_owner_or_admin_on_user_routes() {
        let app = TestApp::new().await;
        let alice = app.create_user("alice", "a@b.com", Role::User).await;
        let bob = app.create_user("bob", "bob@b.com", Role::User).await;
        let admin = app.create_user("admin", "admin@b.com", Role::Admin).await;

        let path = format!("/api/user/{}", alice.id);
        app.server
            .get(&path)
            .add_header("authorization", bearer(&app.access_token(&alice)))
            .await
            .assert_status_ok();
        app.server
            .get(&path)
            .add_header("authorization", bearer(&app.access_token(&admin)))
            .await
            .assert_status_ok();

        let response = app
            .server
            .get(&path)
            .add_header("authorization", bearer(&app.access_token(&bob)))
            .await;
        response.assert_status_forbidden();
        assert_eq!(response.json::<Value>()["message"], "Access denied: not the owner or admin");

        app.server
            .get("/api/user/abc")
            .add_header("authorization", bearer(&app.access_token(&admin)))
            .await
            .assert_status_bad_request();
    }

    #[test_log::test(tokio::test)]
    async fn test_only_admins_change_roles() {
        let app = TestApp::new().await;
        let alice = app.create_user("alice", "a@b.com", Role::User).await;
        let admin = app.create_user("admin", "admin@b.com", Role::Admin).await;
        let path = format!("/api/user/{}", alice.id);

        let response = app
            .server
            .patch(&path)
            .add_header("authorization", bearer(&app.access_token(&alice)))
            .json(&json!({"names": "Alice A."}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["names"], "Alice A.");

        app.server
            .patch(&path)
            .add_header("authorization", bearer(&app.access_token(&alice)))
            .json(&json!({"role": "admin"}))
            .await
            .assert_status_forbidden();

        let response = app
            .server
            .patch(&path)
            .add_header("authorization", bearer(&app.access_token(&admin)))
            .json(&json!({"role": "admin"}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["role"], "admin");
    }

    #[test_log::test(tokio::test)]
    async fn test_admin_deletes_other_user_non_owner_forbidden() {
        let app = TestApp::new().await;
        let alice = app.create_user("alice", "a@b.com", Role::User).await;
        let bob = app.create_user("bob", "bob@b.com", Role::User).await;
        let admin = app.create_user("admin", "admin@b.com", Role::Admin).await;
        let path = format!("/api/user/{}", alice.id);

        app.server
            .delete(&path)
            .add_header("authorization", bearer(&app.access_token(&bob)))
            .await
            .assert_status_forbidden();

        let response = app
            .server
            .delete(&path)
            .add_header("authorization", bearer(&app.access_token(&admin)))
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({"status": "success", "message": "User deleted successfully"})
        );
        assert!(app.store.users().get_by_id(alice.id).await.unwrap().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_self_delete_requires_password() {
        let app = TestApp::new().await;
        let alice = app.create_user("alice", "a@b.com", Role::User).await;
        let path = format!("/api/user/{}", alice.id);
        let auth = bearer(&app.access_token(&alice));

        app.server
            .delete(&path)
            .add_header("authorization", auth.clone())
            .await
            .assert_status_bad_request();

        app.server
            .delete(&path)
            .add_header("authorization", auth.clone())
            .json(&json!({"password": "wrongpassword"}))
            .await
            .assert_status_unauthorized();

        app.server
            .delete(&path)
            .add_header("authorization", auth)
            .json(&json!({"password": crate::test_utils::TEST_PASSWORD}))
            .await
            .assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_list_users_is_admin_only() {
        let app = TestApp::new().await;
        let alice = app.create_user("alice", "a@b.com", Role::User).await;
        let admin = app.create_user("admin", "admin@b.com", Role::Admin).await;

        let response = app
            .server
            .get("/api/user")
            .add_header("authorization", bearer(&app.access_token(&alice)))
            .await;
        response.assert_status_forbidden();
        assert_eq!(response.json::<Value>()["message"], "Access denied: admin privileges required");

        let response = app
            .server
            .get("/api/user")
            .add_query_param("limit", 1)
            .add_header("authorization", bearer(&app.access_token(&admin)))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["total_count"], 2);
        assert_eq!(body["limit"], 1);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }
}
