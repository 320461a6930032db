//! Bearer-token authentication for protected routes.
//!
//! [`CurrentUser`] is an axum extractor: any handler that takes one only runs once the request's
//! `Authorization: Bearer <token>` header carries a valid access token. The user is built from the
//! token claims alone, so no store lookup happens on this path.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tracing::{instrument, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::tokens::TokenService,
    errors::{Error, Result},
};

/// Pull the raw token out of an `Authorization: Bearer <token>` header.
///
/// A missing header, a non-UTF-8 value, another scheme or an empty token are all
/// [`Error::MalformedToken`].
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers.get(AUTHORIZATION).ok_or(Error::MalformedToken)?;
    let value = value.to_str().map_err(|_| Error::MalformedToken)?;

    let (scheme, token) = value.split_once(' ').ok_or(Error::MalformedToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(Error::MalformedToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(Error::MalformedToken);
    }
    Ok(token)
}

/// Authenticate a request from its headers alone.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<CurrentUser> {
    let token = bearer_token(headers)?;
    let claims = tokens.verify_access_token(token)?;
    Ok(CurrentUser::from(claims))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Permission extractors call this again; verify once per request
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let user = authenticate(&parts.headers, &state.tokens)?;
        trace!(user_id = user.id, "Authenticated bearer token");
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
