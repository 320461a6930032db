//! Login and refresh.
//!
//! Login resolves an identity (email or username) to a user, checks the password and issues an
//! access/refresh token pair. Refresh exchanges a refresh token for a new access token; the
//! refresh token itself is not rotated and is not checked against any persisted allow-list.

use tracing::{debug, info, instrument};
use validator::ValidateEmail;

use crate::{
    api::models::{
        auth::{LoginRequest, LoginResponse, RefreshResponse},
        users::PublicUser,
    },
    auth::{password::PasswordHasher, tokens::TokenService},
    db::{Store, models::users::UserDBResponse},
    errors::{Error, Result},
};

/// How a login identity is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity<'a> {
    Email(&'a str),
    Username(&'a str),
}

impl<'a> Identity<'a> {
    /// Anything with valid address syntax is an email; everything else is a username.
    pub fn classify(identity: &'a str) -> Self {
        if identity.validate_email() {
            Identity::Email(identity)
        } else {
            Identity::Username(identity)
        }
    }

    async fn lookup(self, store: &dyn Store) -> Result<Option<UserDBResponse>> {
        let user = match self {
            Identity::Email(email) => store.users().get_user_by_email(email).await?,
            Identity::Username(username) => store.users().get_user_by_username(username).await?,
        };
        Ok(user)
    }
}

/// Verify credentials and issue a token pair.
///
/// An unknown identity and a wrong password both end in [`Error::InvalidCredentials`], and both
/// paths perform exactly one bcrypt verification.
#[instrument(skip_all, err)]
pub async fn login(
    store: &dyn Store,
    hasher: &PasswordHasher,
    tokens: &TokenService,
    request: LoginRequest,
) -> Result<LoginResponse> {
    let identity = Identity::classify(&request.identity);

    let Some(user) = identity.lookup(store).await? else {
        debug!("Login for unknown identity");
        hasher.dummy_verify(request.password).await?;
        return Err(Error::InvalidCredentials);
    };

    if !hasher.verify(request.password, user.password_hash.clone()).await? {
        debug!(user_id = user.id, "Login with wrong password");
        return Err(Error::InvalidCredentials);
    }

    let access_token = tokens.issue_access_token(&user)?;
    let refresh_token = tokens.issue_refresh_token(&user)?;
    info!(user_id = user.id, "User logged in");

    Ok(LoginResponse {
        message: "Login successful".to_string(),
        access_token,
        refresh_token,
        user: PublicUser::from(&user),
    })
}

/// Exchange a refresh token for a fresh access token carrying the user's current role.
#[instrument(skip_all, err)]
pub async fn refresh(store: &dyn Store, tokens: &TokenService, refresh_token: &str) -> Result<RefreshResponse> {
    let claims = tokens.verify_refresh_token(refresh_token)?;

    let user = store.users().get_by_id(claims.user_id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: claims.user_id.to_string(),
    })?;

    Ok(RefreshResponse {
        access_token: tokens.issue_access_token(&user)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::models::users::Role,
        auth::tokens::{ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL},
        db::{MemoryStore, Repository, models::users::UserCreateDBRequest},
    };

    const TEST_COST: u32 = 4;

    struct Fixture {
        store: MemoryStore,
        hasher: PasswordHasher,
        tokens: TokenService,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let hasher = PasswordHasher::new(TEST_COST).unwrap();
        let password_hash = hasher.hash("longenough1".to_string()).await.unwrap();
        store
            .users()
            .create(&UserCreateDBRequest {
                username: "alice".to_string(),
                email: "a@b.com".to_string(),
                password_hash,
                names: None,
                role: Role::User,
            })
            .await
            .unwrap();

        Fixture {
            store,
            hasher,
            tokens: TokenService::new("access-secret", "refresh-secret", ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL),
        }
    }

    fn credentials(identity: &str, password: &str) -> LoginRequest {
        LoginRequest {
            identity: identity.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_identity_classification() {
        assert_eq!(Identity::classify("a@b.com"), Identity::Email("a@b.com"));
        assert_eq!(Identity::classify("alice"), Identity::Username("alice"));
        assert_eq!(Identity::classify("alice@"), Identity::Username("alice@"));
    }

    #[tokio::test]
    async fn test_login_by_username_and_email() {
        let f = fixture().await;

        for identity in ["alice", "a@b.com"] {
            let response = login(&f.store, &f.hasher, &f.tokens, credentials(identity, "longenough1"))
                .await
                .unwrap();
            assert_eq!(response.user.username, "alice");
            assert_eq!(response.user.email, "a@b.com");
            assert!(!response.access_token.is_empty());
            assert_ne!(response.access_token, response.refresh_token);

            let claims = f.tokens.verify_access_token(&response.access_token).unwrap();
            assert_eq!(claims.user_id, response.user.id);
            f.tokens.verify_refresh_token(&response.refresh_token).unwrap();
        }
    }

    #[tokio::test]
    async fn test_unknown_identity_and_wrong_password_look_the_same() {
        let f = fixture().await;

        let unknown = login(&f.store, &f.hasher, &f.tokens, credentials("nobody", "longenough1"))
            .await
            .unwrap_err();
        let wrong = login(&f.store, &f.hasher, &f.tokens, credentials("alice", "wrongpassword"))
            .await
            .unwrap_err();

        assert!(matches!(unknown, Error::InvalidCredentials));
        assert!(matches!(wrong, Error::InvalidCredentials));
        assert_eq!(unknown.status_code(), wrong.status_code());
        assert_eq!(unknown.user_message(), wrong.user_message());
    }

    #[tokio::test]
    async fn test_refresh_issues_access_token_only() {
        let f = fixture().await;
        let session = login(&f.store, &f.hasher, &f.tokens, credentials("alice", "longenough1"))
            .await
            .unwrap();

        let refreshed = refresh(&f.store, &f.tokens, &session.refresh_token).await.unwrap();
        let claims = f.tokens.verify_access_token(&refreshed.access_token).unwrap();
        assert_eq!(claims.user_id, session.user.id);

        // The refresh token is not rotated, so it keeps working
        refresh(&f.store, &f.tokens, &session.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let f = fixture().await;
        let session = login(&f.store, &f.hasher, &f.tokens, credentials("alice", "longenough1"))
            .await
            .unwrap();

        let err = refresh(&f.store, &f.tokens, &session.access_token).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_user() {
        let f = fixture().await;
        let session = login(&f.store, &f.hasher, &f.tokens, credentials("alice", "longenough1"))
            .await
            .unwrap();
        f.store.users().delete(session.user.id).await.unwrap();

        let err = refresh(&f.store, &f.tokens, &session.refresh_token).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
