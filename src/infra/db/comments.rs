use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{CommentsRepo, CreateCommentParams, RepoError};
use crate::domain::entities::CommentRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        sqlx::query_as::<_, CommentRecord>(
            "SELECT id, post_id, creator_id, content, created_at, modified_at \
             FROM comments WHERE post_id = $1 ORDER BY created_at, id",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        sqlx::query_as::<_, CommentRecord>(
            "INSERT INTO comments (id, post_id, creator_id, content) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, post_id, creator_id, content, created_at, modified_at",
        )
        .bind(Uuid::new_v4())
        .bind(params.post_id)
        .bind(params.creator_id)
        .bind(&params.content)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
