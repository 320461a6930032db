//! # bookquest: reading and quiz platform backend
//!
//! `bookquest` serves a catalogue of books split into chapters, per-chapter quizzes, and each
//! reader's progress through them. Everything except registration, login and token refresh sits
//! behind JWT authentication.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer. Data
//! lives behind the [`db::Store`] trait, implemented by PostgreSQL (via sqlx) for deployments and
//! by a process-local store for development and tests.
//!
//! ### Request Flow
//!
//! Every request under `/api` goes through the same steps:
//!
//! 1. **Authentication**: protected handlers take a
//!    [`CurrentUser`](api::models::users::CurrentUser), which reads the `Authorization: Bearer`
//!    header and verifies the access token. A missing or malformed header is rejected with 400, an
//!    invalid or expired token with 401.
//! 2. **Authorization**: [`AdminUser`](auth::permissions::AdminUser) and
//!    [`OwnerOrAdmin`](auth::permissions::OwnerOrAdmin) check the caller's role and, for per-user
//!    routes, the `{id}` path segment. Failures are 403.
//! 3. **Handler**: only now is the body parsed and validated and the store touched.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) holds handlers and request/response models. The **authentication
//! layer** ([`auth`]) holds password hashing, token issuance and verification, the guards, and the
//! login/refresh flow. The **database layer** ([`db`]) defines repository traits per entity and
//! the two backends.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use bookquest::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = bookquest::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     bookquest::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    auth::{password::PasswordHasher, tokens::TokenService},
    config::CorsOrigin,
    db::{Store, models::users::UserCreateDBRequest, models::users::UserUpdateDBRequest},
    openapi::ApiDoc,
};
use axum::{
    Json, Router,
    http::{self, HeaderName, HeaderValue, Method},
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{BookId, ChapterId, Operation, Permission, QuestionId, QuizId, UserId};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `store`: Repositories of the configured storage backend
/// - `config`: Application configuration loaded from environment/files
/// - `hasher`: bcrypt hasher at the configured cost, with its precomputed dummy hash
/// - `tokens`: Access and refresh token issuer/verifier
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .store(store)
///     .config(config)
///     .hasher(hasher)
///     .tokens(tokens)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub hasher: PasswordHasher,
    pub tokens: TokenService,
}

/// Make sure the configured admin account exists and can log in.
///
/// If a user with `email` already exists it is promoted to admin, and its password is reset when
/// one is given. Otherwise a new admin is created; that needs a password, so without one the
/// bootstrap is skipped and `None` is returned.
#[instrument(skip_all, fields(email = %email))]
pub async fn create_initial_admin_user(
    store: &dyn Store,
    hasher: &PasswordHasher,
    email: &str,
    username: Option<&str>,
    password: Option<&str>,
) -> errors::Result<Option<UserId>> {
    let password_hash = match password {
        Some(password) => Some(hasher.hash(password.to_string()).await?),
        None => None,
    };

    if let Some(existing) = store.users().get_user_by_email(email).await? {
        let update = UserUpdateDBRequest {
            names: None,
            role: Some(Role::Admin),
            password_hash,
        };
        store.users().update(existing.id, &update).await?;
        info!("Initial admin user {} is up to date", existing.username);
        return Ok(Some(existing.id));
    }

    let Some(password_hash) = password_hash else {
        warn!("admin_email is set but no admin_password; skipping initial admin creation");
        return Ok(None);
    };

    let created = store
        .users()
        .create(&UserCreateDBRequest {
            username: username.unwrap_or(email).to_string(),
            email: email.to_string(),
            password_hash,
            names: None,
            role: Role::Admin,
        })
        .await?;

    info!("Created initial admin user {}", created.username);
    Ok(Some(created.id))
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.cors;

    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        if cors_config.allow_credentials {
            anyhow::bail!("auth.cors: a wildcard origin cannot be combined with allow_credentials");
        }
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Origins never carry the trailing slash Url adds
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut exposed_headers = Vec::new();
    for header in &cors_config.exposed_headers {
        exposed_headers.push(header.parse::<HeaderName>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials)
        .expose_headers(exposed_headers);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// The router contains:
/// - The `/api` surface (auth, users, books, chapters, quizzes, progress)
/// - OpenAPI JSON at `/api/openapi.json` and the Scalar UI at `/api/docs`
/// - `/healthz`
/// - Optional Prometheus metrics at `/internal/metrics`
/// - CORS and tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{auth, books, chapters, progress, quizzes, status, users};

    let api_routes = Router::new()
        .route("/", get(status::hello))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/token/refresh", post(auth::refresh))
        // Users
        .route("/user/register", post(users::register))
        .route("/user/me", get(users::get_me))
        .route("/user", get(users::list_users))
        .route(
            "/user/{id}",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        )
        .route("/user/{id}/progress", get(progress::get_progress).put(progress::put_progress))
        // Books
        .route("/book", get(books::list_books).post(books::create_book))
        .route(
            "/book/{id}",
            get(books::get_book).patch(books::update_book).delete(books::delete_book),
        )
        // Chapters
        .route(
            "/books/{book_id}/chapters",
            get(chapters::list_chapters).post(chapters::create_chapter),
        )
        .route(
            "/chapters/{chapter_id}",
            get(chapters::get_chapter)
                .put(chapters::update_chapter)
                .delete(chapters::delete_chapter),
        )
        // Quizzes
        .route(
            "/chapters/{chapter_id}/quiz",
            get(quizzes::get_chapter_quiz).post(quizzes::create_quiz),
        )
        .route("/quizzes/{quiz_id}", get(quizzes::get_quiz).delete(quizzes::delete_quiz))
        .route("/quizzes/{quiz_id}/submit", post(quizzes::submit_quiz))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(status::healthz))
        .nest("/api", api_routes);

    let mut router = router.layer(create_cors_layer(&state.config)?);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and runs the server.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] opens the store (running migrations for PostgreSQL),
///    prepares the hasher and token service, and bootstraps the initial admin
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal resolves, in-flight requests finish, then the store
///    is closed and telemetry flushed
pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting bookquest with configuration: {:#?}", config);

        let database = config
            .database
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("database is not configured"))?;
        let store = db::connect(database).await?;

        // Computing the dummy hash at production cost takes a noticeable moment
        let cost = config.auth.password.bcrypt_cost;
        let hasher = tokio::task::spawn_blocking(move || PasswordHasher::new(cost)).await??;
        let tokens = TokenService::from_config(&config)?;

        if let Some(email) = config.admin_email.as_deref() {
            create_initial_admin_user(
                store.as_ref(),
                &hasher,
                email,
                config.admin_username.as_deref(),
                config.admin_password.as_deref(),
            )
            .await?;
        }

        let app_state = AppState::builder()
            .store(store)
            .config(config.clone())
            .hasher(hasher)
            .tokens(tokens)
            .build();

        let router = build_router(&app_state)?;

        Ok(Self {
            router,
            app_state,
            config,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("bookquest listening on http://{}", bind_addr);

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        self.app_state.store.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        auth::password::verify_string,
        config::DatabaseConfig,
        db::{MemoryStore, Repository},
        test_utils::{TEST_COST, create_test_config},
    };

    #[test_log::test(tokio::test)]
    async fn test_create_initial_admin_user_new_user() {
        let store = MemoryStore::new();
        let hasher = PasswordHasher::new(TEST_COST).unwrap();

        let user_id = create_initial_admin_user(&store, &hasher, "admin@example.com", Some("admin"), Some("hunter22"))
            .await
            .unwrap()
            .expect("admin should be created");

        let user = store.users().get_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(user.email, "admin@example.com");
        assert_eq!(user.username, "admin");
        assert_eq!(user.role, Role::Admin);
        assert!(verify_string("hunter22", &user.password_hash));
    }

    #[test_log::test(tokio::test)]
    async fn test_create_initial_admin_user_existing_user() {
        let store = MemoryStore::new();
        let hasher = PasswordHasher::new(TEST_COST).unwrap();
        let existing = store
            .users()
            .create(&UserCreateDBRequest {
                username: "boss".to_string(),
                email: "boss@example.com".to_string(),
                password_hash: hasher.hash("oldpassword".to_string()).await.unwrap(),
                names: None,
                role: Role::User,
            })
            .await
            .unwrap();

        let returned = create_initial_admin_user(&store, &hasher, "boss@example.com", None, Some("newpassword"))
            .await
            .unwrap();
        assert_eq!(returned, Some(existing.id));

        let user = store.users().get_by_id(existing.id).await.unwrap().unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(verify_string("newpassword", &user.password_hash));
        assert!(!verify_string("oldpassword", &user.password_hash));
        assert_eq!(store.users().count().await.unwrap(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_create_initial_admin_user_without_password_is_skipped() {
        let store = MemoryStore::new();
        let hasher = PasswordHasher::new(TEST_COST).unwrap();

        let returned = create_initial_admin_user(&store, &hasher, "admin@example.com", None, None)
            .await
            .unwrap();
        assert_eq!(returned, None);
        assert_eq!(store.users().count().await.unwrap(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_application_integration() {
        let mut config = create_test_config();
        config.database = Some(DatabaseConfig::Memory);
        config.admin_email = Some("admin@example.com".to_string());
        config.admin_password = Some("adminpass1".to_string());

        let server = Application::new(config).await.unwrap().into_test_server();

        let health = server.get("/healthz").await;
        health.assert_status_ok();
        assert_eq!(health.text(), "OK");

        // Protected routes need a bearer token
        server.get("/api/user/me").await.assert_status_bad_request();

        let login = server
            .post("/api/auth/login")
            .json(&serde_json::json!({"identity": "admin@example.com", "password": "adminpass1"}))
            .await;
        login.assert_status_ok();
        let body: serde_json::Value = login.json();
        assert_eq!(body["user"]["role"], "admin");

        server.get("/api/docs").await.assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_build_router_with_metrics_disabled() {
        let app = crate::test_utils::TestApp::new().await;
        let response = app.server.get("/internal/metrics").await;
        response.assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_build_router_with_metrics_enabled() {
        let mut config = create_test_config();
        config.enable_metrics = true;

        let server = Application::new(config).await.unwrap().into_test_server();
        server.get("/healthz").await.assert_status_ok();

        let metrics = server.get("/internal/metrics").await;
        metrics.assert_status_ok();
    }

    #[test]
    fn test_cors_wildcard_with_credentials_rejected() {
        let mut config = create_test_config();
        config.auth.cors.allowed_origins = vec![CorsOrigin::Wildcard];
        config.auth.cors.allow_credentials = true;
        assert!(create_cors_layer(&config).is_err());

        config.auth.cors.allow_credentials = false;
        assert!(create_cors_layer(&config).is_ok());
    }
}
