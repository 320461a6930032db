//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via the [`Store`](crate::db::Store) repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`auth`]: Login and access-token refresh
//! - [`users`]: Registration, profiles and user management
//! - [`books`]: Book catalogue CRUD
//! - [`chapters`]: Chapters of a book
//! - [`quizzes`]: Chapter quizzes and submission grading
//! - [`progress`]: Per-user reading progress
//! - [`status`]: Greeting and liveness probe
//!
//! # Authentication
//!
//! Protected handlers take a [`CurrentUser`](crate::api::models::users::CurrentUser),
//! [`AdminUser`](crate::auth::permissions::AdminUser) or
//! [`OwnerOrAdmin`](crate::auth::permissions::OwnerOrAdmin) argument. Extractors run in argument
//! order, so the guard is listed before any body extractor.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which converts to the appropriate HTTP status code and
//! a `{"status": "error", "message": ...}` body.

pub mod auth;
pub mod books;
pub mod chapters;
pub mod progress;
pub mod quizzes;
pub mod status;
pub mod users;
