//! Post write operations with the author-or-staff permission rule.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, TagsWriteRepo, UpdatePostParams,
};
use crate::domain::entities::PostRecord;
use crate::domain::slug::{SlugAsyncError, SlugError, generate_unique_slug};
use crate::domain::types::Actor;
use crate::domain::visibility;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("authentication required")]
    Unauthorized,
    #[error("only the author or staff may modify a post")]
    Forbidden,
    #[error("post not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<SlugAsyncError<RepoError>> for PostError {
    fn from(error: SlugAsyncError<RepoError>) -> Self {
        match error {
            SlugAsyncError::Slug(err) => PostError::Slug(err),
            SlugAsyncError::Predicate(err) => PostError::Repo(err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub slug: Option<String>,
    pub summary: String,
    pub content: String,
    pub published_at: Option<OffsetDateTime>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostCommand {
    pub title: String,
    pub slug: Option<String>,
    pub summary: String,
    pub content: String,
    pub published_at: Option<OffsetDateTime>,
    pub tags: Vec<String>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    posts_write: Arc<dyn PostsWriteRepo>,
    tags_write: Arc<dyn TagsWriteRepo>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        posts_write: Arc<dyn PostsWriteRepo>,
        tags_write: Arc<dyn TagsWriteRepo>,
    ) -> Self {
        Self {
            posts,
            posts_write,
            tags_write,
        }
    }

    /// Create a post authored by the requester. The slug falls back to a
    /// unique derivation from the title when the caller does not supply one.
    pub async fn create(
        &self,
        actor: Actor,
        command: CreatePostCommand,
    ) -> Result<PostRecord, PostError> {
        let author_id = actor.user_id().ok_or(PostError::Unauthorized)?;

        let title = command.title.trim().to_string();
        if title.is_empty() {
            return Err(PostError::Validation("title must not be empty".to_string()));
        }

        let slug = match command.slug {
            Some(slug) => slug,
            None => {
                generate_unique_slug(&title, |candidate| {
                    let posts = self.posts.clone();
                    let candidate = candidate.to_string();
                    async move { Ok::<bool, RepoError>(!posts.slug_exists(&candidate).await?) }
                })
                .await?
            }
        };

        let post = self
            .posts_write
            .create_post(CreatePostParams {
                author_id,
                title,
                slug,
                summary: command.summary,
                content: command.content,
                published_at: command.published_at,
            })
            .await?;

        self.attach_tags(post.id, &command.tags).await?;

        info!(post_id = %post.id, slug = %post.slug, "created post");
        Ok(post)
    }

    /// Full update. Posts outside the actor's visible set answer not-found;
    /// visible posts the actor does not own answer forbidden.
    pub async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        command: UpdatePostCommand,
        now: OffsetDateTime,
    ) -> Result<PostRecord, PostError> {
        let existing = self.load_for_modification(actor, id, now).await?;

        let title = command.title.trim().to_string();
        if title.is_empty() {
            return Err(PostError::Validation("title must not be empty".to_string()));
        }

        let post = self
            .posts_write
            .update_post(UpdatePostParams {
                id,
                title,
                slug: command.slug.unwrap_or(existing.slug),
                summary: command.summary,
                content: command.content,
                published_at: command.published_at,
            })
            .await?;

        self.attach_tags(post.id, &command.tags).await?;

        info!(post_id = %post.id, "updated post");
        Ok(post)
    }

    pub async fn delete(
        &self,
        actor: Actor,
        id: Uuid,
        now: OffsetDateTime,
    ) -> Result<(), PostError> {
        let post = self.load_for_modification(actor, id, now).await?;
        self.posts_write.delete_post(post.id).await?;
        info!(post_id = %post.id, slug = %post.slug, "deleted post");
        Ok(())
    }

    async fn load_for_modification(
        &self,
        actor: Actor,
        id: Uuid,
        now: OffsetDateTime,
    ) -> Result<PostRecord, PostError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(PostError::NotFound)?;

        if !visibility::can_view(&post, actor, now) {
            return Err(PostError::NotFound);
        }
        if !actor.may_modify(&post) {
            return Err(PostError::Forbidden);
        }

        Ok(post)
    }

    async fn attach_tags(&self, post_id: Uuid, values: &[String]) -> Result<(), PostError> {
        let mut tag_ids = Vec::with_capacity(values.len());
        for value in values {
            let normalized = value.trim().to_lowercase();
            if normalized.is_empty() {
                continue;
            }
            let tag = self.tags_write.ensure_tag(&normalized).await?;
            if !tag_ids.contains(&tag.id) {
                tag_ids.push(tag.id);
            }
        }

        self.posts_write.replace_post_tags(post_id, &tag_ids).await?;
        Ok(())
    }
}
