//! Token authentication against the stored user directory.
//!
//! Tokens are issued elsewhere; this service only resolves a presented token
//! to an [`Actor`]. The stored digest is compared in constant time against
//! the digest of the presented token.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::types::Actor;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token")]
    Invalid,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepo>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UsersRepo>) -> Self {
        Self { users }
    }

    /// Resolve a presented token to the actor it authenticates.
    pub async fn authenticate(&self, token: &str) -> Result<Actor, AuthError> {
        let digest = Self::token_digest(token);

        let user = self
            .users
            .find_by_token_digest(&digest)
            .await?
            .ok_or(AuthError::Invalid)?;

        let stored = user.token_digest.as_deref().ok_or(AuthError::Invalid)?;
        if bool::from(stored.as_bytes().ct_eq(digest.as_bytes())) {
            Ok(Actor::for_user(user.id, user.is_staff))
        } else {
            Err(AuthError::Invalid)
        }
    }

    pub fn token_digest(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}
