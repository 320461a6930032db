//! PostgreSQL repository implementations.
//!
//! Each repository wraps a [`sqlx::PgPool`] and implements one of the traits in [`repository`].
//! Handlers never see these types directly; they go through [`crate::db::Store`], which also has
//! an in-memory implementation in [`crate::db::memory`].
//!
//! # Available Repositories
//!
//! - [`Users`]: credential store, lookups by id, email and username
//! - [`Books`]: book catalogue
//! - [`Chapters`]: chapters of a book
//! - [`Quizzes`]: one quiz per chapter with ordered questions
//! - [`Progress`]: per-user chapter completion
//!
//! ```ignore
//! use bookquest::db::handlers::{Repository, UserRepository, Users};
//!
//! async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let users = Users::new(pool);
//!     if let Some(user) = users.get_user_by_email("user@example.com").await? {
//!         println!("Found user: {}", user.username);
//!     }
//!     Ok(())
//! }
//! ```

pub mod books;
pub mod chapters;
pub mod progress;
pub mod quizzes;
pub mod repository;
pub mod users;

pub use books::Books;
pub use chapters::Chapters;
pub use progress::Progress;
pub use quizzes::Quizzes;
pub use repository::{BookRepository, ChapterRepository, ProgressRepository, QuizRepository, Repository, UserRepository};
pub use users::Users;
