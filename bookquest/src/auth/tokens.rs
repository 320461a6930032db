//! JWT access and refresh token issuance and verification.
//!
//! Both token kinds are HS256-signed compact JWTs, each with its own secret. Verification pins the
//! algorithm to HS256, applies no expiry leeway, and decodes into statically typed claims, so a
//! missing or mistyped field is rejected at decode time like any other invalid token.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{api::models::users::Role, config::Config, db::models::users::UserDBResponse, errors::Error, types::UserId};

/// Default lifetime of an access token.
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Default lifetime of a refresh token.
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub user_id: UserId,
    pub exp: i64,
}

/// The only header ever used for signing.
fn signing_header() -> Header {
    Header::new(Algorithm::HS256)
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp"]);
    validation
}

/// Sign `claims` with HS256.
pub fn sign<C: Serialize>(claims: &C, key: &EncodingKey) -> Result<String, Error> {
    encode(&signing_header(), claims, key).map_err(|e| Error::Internal {
        operation: format!("sign JWT: {e}"),
    })
}

/// Verify `token` against `key` and decode its claims.
///
/// Every failure (bad signature, foreign algorithm, expiry, malformed structure, missing or
/// mistyped claim) yields the same [`Error::InvalidToken`]. The underlying reason is only
/// logged at debug level.
pub fn verify<C: DeserializeOwned>(token: &str, key: &DecodingKey) -> Result<C, Error> {
    decode::<C>(token, key, &validation())
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("JWT rejected: {:?}", e.kind());
            Error::InvalidToken
        })
}

/// Issues and verifies access and refresh tokens.
///
/// Built once at startup from configuration and shared read-only between requests.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(access_secret: &str, refresh_secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let access_secret = config.jwt_secret.as_deref().ok_or_else(|| Error::Internal {
            operation: "JWT: jwt_secret is required".to_string(),
        })?;
        let refresh_secret = config.jwt_refresh_secret.as_deref().ok_or_else(|| Error::Internal {
            operation: "JWT: jwt_refresh_secret is required".to_string(),
        })?;

        Ok(Self::new(
            access_secret,
            refresh_secret,
            config.auth.access_token_expiry,
            config.auth.refresh_token_expiry,
        ))
    }

    /// Create an access token for a user snapshot
    pub fn issue_access_token(&self, user: &UserDBResponse) -> Result<String, Error> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now,
            exp: now + self.access_ttl.as_secs() as i64,
        };
        sign(&claims, &self.access_encoding)
    }

    /// Create a refresh token for a user snapshot
    pub fn issue_refresh_token(&self, user: &UserDBResponse) -> Result<String, Error> {
        let claims = RefreshClaims {
            user_id: user.id,
            exp: Utc::now().timestamp() + self.refresh_ttl.as_secs() as i64,
        };
        sign(&claims, &self.refresh_encoding)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, Error> {
        verify(token, &self.access_decoding)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, Error> {
        verify(token, &self.refresh_decoding).map_err(|_| Error::InvalidRefreshToken)
    }
}
