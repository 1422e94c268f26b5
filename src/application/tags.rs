//! Tag retrieval and the (deliberately narrow) tag write surface.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{RepoError, TagsRepo, TagsWriteRepo};
use crate::domain::entities::TagRecord;
use crate::domain::types::Actor;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("authentication required")]
    Unauthorized,
    #[error("staff access required")]
    Forbidden,
    #[error("tag not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct TagService {
    tags: Arc<dyn TagsRepo>,
    tags_write: Arc<dyn TagsWriteRepo>,
}

impl TagService {
    pub fn new(tags: Arc<dyn TagsRepo>, tags_write: Arc<dyn TagsWriteRepo>) -> Self {
        Self { tags, tags_write }
    }

    pub async fn list(&self) -> Result<Vec<TagRecord>, TagError> {
        Ok(self.tags.list_tags().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<TagRecord, TagError> {
        self.tags.find_by_id(id).await?.ok_or(TagError::NotFound)
    }

    pub async fn values_for_post(&self, post_id: Uuid) -> Result<Vec<String>, TagError> {
        Ok(self.tags.values_for_post(post_id).await?)
    }

    /// Tag values are normalized to trimmed lowercase before storage.
    pub async fn create(&self, actor: Actor, value: &str) -> Result<TagRecord, TagError> {
        if actor.user_id().is_none() {
            return Err(TagError::Unauthorized);
        }

        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(TagError::Validation("tag value must not be empty".to_string()));
        }

        let tag = self.tags_write.create_tag(&normalized).await?;
        info!(tag_id = %tag.id, value = %tag.value, "created tag");
        Ok(tag)
    }

    pub async fn delete(&self, actor: Actor, id: Uuid) -> Result<(), TagError> {
        if !actor.is_staff() {
            return Err(TagError::Forbidden);
        }

        let tag = self.get(id).await?;
        self.tags_write.delete_tag(tag.id).await?;
        info!(tag_id = %tag.id, value = %tag.value, "deleted tag");
        Ok(())
    }
}
