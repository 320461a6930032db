//! Role and ownership checks.
//!
//! The predicates here are pure functions over an already verified [`CurrentUser`]; they never
//! touch the store. The role they see is the one embedded in the access token at issuance, so a
//! role change only takes effect once the holder's current access token expires.
//!
//! Two extractors wrap them for handlers:
//!
//! - [`AdminUser`]: the caller must be an admin
//! - [`OwnerOrAdmin`]: the caller must be the user named by the `{id}` path segment, or an admin

use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Path},
    http::{Method, request::Parts},
};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    errors::{Error, Result},
    types::{Operation, Permission, UserId},
};

/// Whether `user` holds the admin role.
pub fn is_admin(user: &CurrentUser) -> bool {
    user.role == Role::Admin
}

/// Whether `user` is `target` or an admin.
pub fn is_owner_or_admin(user: &CurrentUser, target: UserId) -> bool {
    is_admin(user) || user.id == target
}

/// Parse a user id taken from a request path.
pub fn parse_target_id(raw: &str) -> Result<UserId> {
    raw.parse::<UserId>().map_err(|e| Error::BadRequest {
        message: format!("Invalid user ID in path: {e}"),
    })
}

/// Require the admin role, reporting `action` on `resource` if denied.
pub fn require_admin(user: &CurrentUser, action: Operation, resource: &str) -> Result<()> {
    if is_admin(user) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Permission::Admin,
            action,
            resource: resource.to_string(),
        })
    }
}

/// Require that `user` is `target` or an admin.
pub fn require_owner_or_admin(user: &CurrentUser, target: UserId, action: Operation) -> Result<()> {
    if is_owner_or_admin(user, target) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Permission::OwnerOrAdmin,
            action,
            resource: format!("user {target}"),
        })
    }
}

/// The operation a request performs, judged by its method
fn operation_for(method: &Method) -> Operation {
    match *method {
        Method::POST => Operation::Create,
        Method::PUT | Method::PATCH => Operation::Update,
        Method::DELETE => Operation::Delete,
        _ => Operation::Read,
    }
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        require_admin(&user, operation_for(&parts.method), parts.uri.path())?;
        Ok(AdminUser(user))
    }
}

/// An authenticated caller allowed to act on the user named by the `{id}` path segment.
#[derive(Debug, Clone)]
pub struct OwnerOrAdmin {
    pub user: CurrentUser,
    pub target: UserId,
}

impl FromRequestParts<AppState> for OwnerOrAdmin {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;

        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| Error::BadRequest { message: e.body_text() })?;
        let raw = params.get("id").ok_or_else(|| Error::BadRequest {
            message: "Missing user ID in path".to_string(),
        })?;
        let target = parse_target_id(raw)?;

        require_owner_or_admin(&user, target, operation_for(&parts.method))?;
        debug!(user_id = user.id, target, "Owner-or-admin check passed");
        Ok(OwnerOrAdmin { user, target })
    }
}
