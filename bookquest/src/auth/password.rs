//! Password hashing and verification.
//!
//! Passwords are hashed with bcrypt. bcrypt only looks at the first 72 bytes of its input, so
//! longer passwords are rejected outright instead of being silently truncated.

use std::sync::Arc;

use tracing::warn;

use crate::errors::Error;

/// bcrypt ignores input past this many bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Work factor used in production.
pub const DEFAULT_COST: u32 = 12;

/// Work factors bcrypt accepts.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Plaintext hashed at startup to produce the dummy hash for unknown identities.
const DUMMY_PASSWORD: &str = "bookquest::timing-equalizer";

/// Hash a password using bcrypt at the given cost.
pub fn hash_string_with_cost(input: &str, cost: u32) -> Result<String, Error> {
    if input.len() > MAX_PASSWORD_BYTES {
        return Err(Error::BadRequest {
            message: format!("Password must be at most {MAX_PASSWORD_BYTES} bytes"),
        });
    }

    bcrypt::hash(input, cost).map_err(|e| Error::Internal {
        operation: format!("hash string: {e}"),
    })
}

/// Verify a password against a hash.
///
/// A mismatch is `false`, never an error. Inputs bcrypt could not have hashed and unparseable
/// stored hashes are also reported as `false`.
pub fn verify_string(input: &str, hash: &str) -> bool {
    if input.len() > MAX_PASSWORD_BYTES {
        return false;
    }

    match bcrypt::verify(input, hash) {
        Ok(matches) => matches,
        Err(e) => {
            warn!("Stored password hash could not be verified: {e}");
            false
        }
    }
}

/// Hashes and verifies passwords off the async runtime.
///
/// Holds a dummy hash computed at construction time with the configured cost. Login runs a
/// verification against it when the identity is unknown, so that path costs the same as a wrong
/// password.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, Error> {
        let dummy_hash = hash_string_with_cost(DUMMY_PASSWORD, cost)?;
        Ok(Self {
            cost,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, password: String) -> Result<String, Error> {
        let cost = self.cost;
        tokio::task::spawn_blocking(move || hash_string_with_cost(&password, cost))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password hashing task: {e}"),
            })?
    }

    pub async fn verify(&self, password: String, hash: String) -> Result<bool, Error> {
        tokio::task::spawn_blocking(move || verify_string(&password, &hash))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password verification task: {e}"),
            })
    }

    /// Burn one verification's worth of work. The result is always discarded.
    pub async fn dummy_verify(&self, password: String) -> Result<(), Error> {
        let hash = self.dummy_hash.to_string();
        self.verify(password, hash).await.map(|_| ())
    }
}
