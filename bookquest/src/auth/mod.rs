//! Authentication and authorization.
//!
//! Users log in with an email or username and a password and receive two HS256 JWTs:
//!
//! - an **access token** (30 minutes by default) sent as `Authorization: Bearer <token>`
//! - a **refresh token** (7 days by default), signed with a separate secret, exchanged at
//!   `/api/token/refresh` for a new access token
//!
//! Verification is stateless: a validly signed, unexpired access token is enough to authenticate.
//! The role it carries is trusted until it expires.
//!
//! Failures map onto three distinct statuses: a missing or malformed bearer header is 400, a token
//! that fails verification is 401, and an authenticated caller without the required role or
//! ownership is 403.
//!
//! # Modules
//!
//! - [`password`]: bcrypt hashing, capped at 72 bytes of input
//! - [`tokens`]: token issuance and algorithm-pinned verification
//! - [`current_user`]: the bearer-token extractor for protected routes
//! - [`permissions`]: admin and owner-or-admin predicates and extractors
//! - [`flow`]: the login and refresh operations
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use bookquest::auth::permissions::{AdminUser, OwnerOrAdmin};
//!
//! async fn delete_book(AdminUser(admin): AdminUser, Path(id): Path<BookId>) -> Result<StatusCode> {
//!     // only reached by admins
//! }
//!
//! async fn get_user(access: OwnerOrAdmin) -> Result<Json<UserResponse>> {
//!     // access.target is the parsed `{id}` path segment
//! }
//! ```

pub mod current_user;
pub mod flow;
pub mod password;
pub mod permissions;
pub mod tokens;
