//! Comment creation and retrieval. Commenting requires a signed-in actor and
//! a post the actor may actually see.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{CommentsRepo, CreateCommentParams, PostsRepo, RepoError};
use crate::domain::entities::CommentRecord;
use crate::domain::types::Actor;
use crate::domain::visibility;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("authentication required to comment")]
    Unauthorized,
    #[error("post not found")]
    PostNotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentsRepo>,
    posts: Arc<dyn PostsRepo>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentsRepo>, posts: Arc<dyn PostsRepo>) -> Self {
        Self { comments, posts }
    }

    pub async fn create(
        &self,
        actor: Actor,
        post_id: Uuid,
        content: String,
        now: OffsetDateTime,
    ) -> Result<CommentRecord, CommentError> {
        let creator_id = actor.user_id().ok_or(CommentError::Unauthorized)?;

        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(CommentError::Validation(
                "comment must not be empty".to_string(),
            ));
        }

        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(CommentError::PostNotFound)?;
        if !visibility::can_view(&post, actor, now) {
            return Err(CommentError::PostNotFound);
        }

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                post_id,
                creator_id,
                content,
            })
            .await?;

        info!(post_id = %post_id, comment_id = %comment.id, "created comment");
        Ok(comment)
    }

    pub async fn for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, CommentError> {
        Ok(self.comments.list_for_post(post_id).await?)
    }
}
