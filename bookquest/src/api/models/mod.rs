//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request deserialization
//! and response serialization. These models define the public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from database models,
//!   allowing independent evolution of API and storage representations
//! - **Validation**: Request models derive `validator::Validate` and are checked by the
//!   [`ValidJson`](crate::api::extract::ValidJson) extractor before a handler runs
//! - **OpenAPI**: All models are annotated with `utoipa` for automatic API docs
//!
//! # Model Categories
//!
//! - [`auth`]: Login and token refresh payloads
//! - [`users`]: Registration, profiles, roles and the authenticated caller
//! - [`books`], [`chapters`], [`quizzes`]: Reading content
//! - [`progress`]: Per-user chapter completion
//! - [`pagination`], [`status`]: Shared envelopes

pub mod auth;
pub mod books;
pub mod chapters;
pub mod pagination;
pub mod progress;
pub mod quizzes;
pub mod status;
pub mod users;
