//! Database record structures.
//!
//! Each entity has request types for writes (`*CreateDBRequest`, `*UpdateDBRequest`) and a
//! response type (`*DBResponse`) that mirrors its table row.

pub mod books;
pub mod chapters;
pub mod progress;
pub mod quizzes;
pub mod users;
