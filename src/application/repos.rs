//! Repository traits describing persistence adapters.
//!
//! The visibility engine never touches a database: repositories hand back
//! candidate sets and the application layer filters them in memory.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::PaginationError;
use crate::domain::entities::{CommentRecord, PostRecord, TagRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Storage-level restriction of the candidate set. Visibility and window
/// filtering happen after the fetch; this only narrows what is worth
/// fetching.
#[derive(Debug, Clone, Default)]
pub struct PostQueryFilter {
    /// Only posts carrying this tag value.
    pub tag: Option<String>,
    /// Case-insensitive substring match on title or summary.
    pub search: Option<String>,
    /// Only posts by this author.
    pub author: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub creator_id: Uuid,
    pub content: String,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Fetch the candidate set for a listing, in storage (insertion) order.
    async fn list_candidates(&self, filter: &PostQueryFilter)
    -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;

    /// Replace the full tag set of a post.
    async fn replace_post_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError>;
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TagRecord>, RepoError>;

    /// Tag values attached to a post, alphabetically.
    async fn values_for_post(&self, post_id: Uuid) -> Result<Vec<String>, RepoError>;
}

#[async_trait]
pub trait TagsWriteRepo: Send + Sync {
    /// Find-or-create a tag by normalized value.
    async fn ensure_tag(&self, value: &str) -> Result<TagRecord, RepoError>;

    async fn create_tag(&self, value: &str) -> Result<TagRecord, RepoError>;

    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments on a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;

    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_token_digest(&self, digest: &str) -> Result<Option<UserRecord>, RepoError>;
}
