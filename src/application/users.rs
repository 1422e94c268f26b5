//! Public user profile lookups.

use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UsersRepo>,
}

impl UserService {
    pub fn new(users: Arc<dyn UsersRepo>) -> Self {
        Self { users }
    }

    pub async fn profile(&self, email: &str) -> Result<UserRecord, UserError> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or(UserError::NotFound)
    }
}
