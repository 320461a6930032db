//! Common type definitions and authorization vocabulary.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, BookId, etc.)
//! - The operations and permissions used when reporting authorization failures
//!
//! # ID Types
//!
//! All entity IDs are database-assigned 64-bit integers wrapped in type aliases:
//!
//! - [`UserId`]: User account identifier
//! - [`BookId`]: Book identifier
//! - [`ChapterId`]: Chapter identifier
//! - [`QuizId`]: Quiz identifier
//! - [`QuestionId`]: Quiz question identifier

use std::fmt;

// Type aliases for IDs
pub type UserId = i64;
pub type BookId = i64;
pub type ChapterId = i64;
pub type QuizId = i64;
pub type QuestionId = i64;

// Operations that can be performed on resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

// Permission types for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Caller must hold the admin role
    Admin,
    /// Caller must be the user addressed by the request, or an admin
    OwnerOrAdmin,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}
