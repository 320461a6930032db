//! Database layer for data persistence and access.
//!
//! Handlers talk to storage through the object-safe [`Store`] trait, which hands out one
//! repository per entity. There are two backends:
//!
//! - [`PgStore`]: PostgreSQL through SQLx, schema managed by the migrations in `migrations/`
//! - [`MemoryStore`]: process-local maps with the same constraints and cascades
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (api::handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │    Store    │  (Arc<dyn Store> in AppState)
//! └──────┬──────┘
//!    ┌───┴────┐
//!    ↓        ↓
//! PgStore  MemoryStore
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: repository traits and their PostgreSQL implementations
//! - [`models`]: database record structures matching table schemas
//! - [`memory`]: the in-memory backend
//! - [`errors`]: database-specific error types

use std::sync::Arc;
use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::config::{DatabaseConfig, PoolSettings};

pub mod errors;
pub mod handlers;
pub mod memory;
pub mod models;

pub use handlers::repository::{
    BookRepository, ChapterRepository, ProgressRepository, QuizRepository, Repository, UserRepository,
};
pub use memory::MemoryStore;

/// Access to every repository of one storage backend.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    fn users(&self) -> &dyn UserRepository;

    fn books(&self) -> &dyn BookRepository;

    fn chapters(&self) -> &dyn ChapterRepository;

    fn quizzes(&self) -> &dyn QuizRepository;

    fn progress(&self) -> &dyn ProgressRepository;

    /// Release backend resources during shutdown
    async fn close(&self) {}
}

/// PostgreSQL-backed store. All repositories share one pool.
pub struct PgStore {
    pool: PgPool,
    users: handlers::Users,
    books: handlers::Books,
    chapters: handlers::Chapters,
    quizzes: handlers::Quizzes,
    progress: handlers::Progress,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: handlers::Users::new(pool.clone()),
            books: handlers::Books::new(pool.clone()),
            chapters: handlers::Chapters::new(pool.clone()),
            quizzes: handlers::Quizzes::new(pool.clone()),
            progress: handlers::Progress::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn books(&self) -> &dyn BookRepository {
        &self.books
    }

    fn chapters(&self) -> &dyn ChapterRepository {
        &self.chapters
    }

    fn quizzes(&self) -> &dyn QuizRepository {
        &self.quizzes
    }

    fn progress(&self) -> &dyn ProgressRepository {
        &self.progress
    }

    async fn close(&self) {
        info!("Closing database connections...");
        self.pool.close().await;
    }
}

/// Get the bookquest database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    let mut options = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));

    // Zero means "never" for both timeouts
    if settings.idle_timeout_secs > 0 {
        options = options.idle_timeout(Duration::from_secs(settings.idle_timeout_secs));
    }
    if settings.max_lifetime_secs > 0 {
        options = options.max_lifetime(Duration::from_secs(settings.max_lifetime_secs));
    }
    options
}

/// Open the configured backend. For PostgreSQL this connects the pool and applies pending
/// migrations before returning.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn Store>> {
    match config {
        DatabaseConfig::Memory => {
            info!("Using in-memory store; data will be lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseConfig::Postgres { url, pool } => {
            info!("Using external database");
            let pool = pool_options(pool).connect(url).await?;
            migrator().run(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}
