//! Request extraction with validation.
//!
//! Wrappers over axum's extractors whose rejections are [`Error::BadRequest`], so a malformed
//! body, path segment or query string gets the same JSON error body as every other failure.
//! Handlers list them after their auth extractor, which keeps authentication ahead of input
//! parsing.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::errors::Error;

/// JSON body that has passed its `validator` rules.
///
/// Malformed JSON and failed validation are both reported as [`Error::BadRequest`] with the
/// parse or validation detail.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| Error::BadRequest { message: e.body_text() })?;

        value.validate().map_err(|e| Error::BadRequest {
            message: describe(&e),
        })?;

        Ok(ValidJson(value))
    }
}

/// Path parameters; unparseable segments are [`Error::BadRequest`].
#[derive(Debug, Clone, Copy)]
pub struct PathParam<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParam<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: PathRejection| Error::BadRequest { message: e.body_text() })?;
        Ok(PathParam(value))
    }
}

/// Query string parameters; malformed queries are [`Error::BadRequest`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| Error::BadRequest { message: e.body_text() })?;
        Ok(QueryParams(value))
    }
}

/// Flatten validation errors into one message, preferring the custom messages on each rule.
fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("Invalid value for {field}"),
            })
        })
        .collect();

    if messages.is_empty() {
        // Only nested errors; fall back to the library's rendering
        return errors.to_string();
    }
    messages.sort();
    messages.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::UserRegister;

    #[test]
    fn test_describe_uses_rule_messages() {
        let register = UserRegister {
            username: "al".to_string(),
            email: "not-an-email".to_string(),
            password: "longenough1".to_string(),
            names: None,
        };
        let errors = register.validate().unwrap_err();

        let message = describe(&errors);
        assert!(message.contains("Username must be between 3 and 32 characters"));
        assert!(message.contains("Invalid email address"));
    }
}
