//! Test utilities for integration testing.

use std::sync::Arc;

use axum_test::TestServer;

use crate::{
    AppState,
    api::models::users::Role,
    auth::{password::PasswordHasher, tokens::TokenService},
    config::{Config, DatabaseConfig},
    db::{
        MemoryStore, Repository, Store,
        models::{
            books::{BookCreateDBRequest, BookDBResponse},
            chapters::{ChapterCreateDBRequest, ChapterDBResponse},
            quizzes::{QuestionCreateDBRequest, QuizCreateDBRequest, QuizDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    types::{BookId, ChapterId},
};

/// Lowest bcrypt cost; production uses 12
pub const TEST_COST: u32 = 4;

/// Password of every user created through [`TestApp::create_user`]
pub const TEST_PASSWORD: &str = "correct-horse-1";

pub const TEST_ACCESS_SECRET: &str = "test-access-secret";
pub const TEST_REFRESH_SECRET: &str = "test-refresh-secret";

pub fn create_test_config() -> Config {
    let mut config = Config {
        port: Some(0),
        database: Some(DatabaseConfig::Memory),
        jwt_secret: Some(TEST_ACCESS_SECRET.to_string()),
        jwt_refresh_secret: Some(TEST_REFRESH_SECRET.to_string()),
        enable_metrics: false,
        ..Default::default()
    };
    config.auth.password.bcrypt_cost = TEST_COST;
    config
}

/// `Authorization` header value for a token
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// A router over an in-memory store, plus direct handles on the pieces tests seed data through.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<dyn Store>,
    pub hasher: PasswordHasher,
    pub tokens: TokenService,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(create_test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let hasher = PasswordHasher::new(config.auth.password.bcrypt_cost).expect("Failed to create hasher");
        let tokens = TokenService::from_config(&config).expect("Failed to create token service");

        let state = AppState::builder()
            .store(store.clone())
            .config(config)
            .hasher(hasher.clone())
            .tokens(tokens.clone())
            .build();

        let router = crate::build_router(&state).expect("Failed to build router");
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            hasher,
            tokens,
        }
    }

    /// Insert a user whose password is [`TEST_PASSWORD`]
    pub async fn create_user(&self, username: &str, email: &str, role: Role) -> UserDBResponse {
        let password_hash = self
            .hasher
            .hash(TEST_PASSWORD.to_string())
            .await
            .expect("Failed to hash test password");

        self.store
            .users()
            .create(&UserCreateDBRequest {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                names: None,
                role,
            })
            .await
            .expect("Failed to create test user")
    }

    pub fn access_token(&self, user: &UserDBResponse) -> String {
        self.tokens.issue_access_token(user).expect("Failed to issue access token")
    }

    pub fn refresh_token(&self, user: &UserDBResponse) -> String {
        self.tokens.issue_refresh_token(user).expect("Failed to issue refresh token")
    }

    pub async fn create_book(&self, title: &str, author: &str) -> BookDBResponse {
        self.store
            .books()
            .create(&BookCreateDBRequest {
                title: title.to_string(),
                author: author.to_string(),
                description: None,
                published_on: None,
            })
            .await
            .expect("Failed to create test book")
    }

    pub async fn create_chapter(&self, book_id: BookId, title: &str) -> ChapterDBResponse {
        self.store
            .chapters()
            .create(&ChapterCreateDBRequest {
                book_id,
                title: title.to_string(),
                content: format!("Text of {title}"),
            })
            .await
            .expect("Failed to create test chapter")
    }

    /// Create a quiz from `(question, answer)` pairs
    pub async fn create_quiz(&self, book_id: BookId, chapter_id: ChapterId, questions: &[(&str, &str)]) -> QuizDBResponse {
        self.store
            .quizzes()
            .create(&QuizCreateDBRequest {
                book_id,
                chapter_id,
                title: "Test quiz".to_string(),
                questions: questions
                    .iter()
                    .map(|(text, answer)| QuestionCreateDBRequest {
                        text: text.to_string(),
                        answer: answer.to_string(),
                    })
                    .collect(),
            })
            .await
            .expect("Failed to create test quiz")
    }
}
