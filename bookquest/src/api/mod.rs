//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//! - **[`extract`]**: The validating JSON body extractor
//!
//! # API Structure
//!
//! Everything is mounted under `/api`:
//!
//! - **Authentication** (`/auth/login`, `/token/refresh`)
//! - **Users** (`/user/*`): Registration, profiles, progress
//! - **Books** (`/book/*`) and **Chapters** (`/books/{id}/chapters`, `/chapters/*`)
//! - **Quizzes** (`/chapters/{id}/quiz`, `/quizzes/*`)
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa` annotations; see [`crate::openapi`]. The rendered
//! documentation is available at `/api/docs` when the server is running.

pub mod extract;
pub mod handlers;
pub mod models;
