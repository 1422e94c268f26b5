use async_trait::async_trait;
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostQueryFilter, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

use super::{PostgresRepositories, map_sqlx_error};

const POST_COLUMNS: &str = "p.id, p.author_id, p.title, p.slug, p.summary, p.content, \
     p.published_at, p.created_at, p.modified_at";

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_candidates(
        &self,
        filter: &PostQueryFilter,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts p WHERE 1=1 "));
        Self::apply_post_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at, p.id ");

        qb.build_query_as::<PostRecord>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM posts WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        sqlx::query_as::<_, PostRecord>(
            "INSERT INTO posts (id, author_id, title, slug, summary, content, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, author_id, title, slug, summary, content, published_at, created_at, modified_at",
        )
        .bind(Uuid::new_v4())
        .bind(params.author_id)
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.summary)
        .bind(&params.content)
        .bind(params.published_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        sqlx::query_as::<_, PostRecord>(
            "UPDATE posts SET title = $2, slug = $3, summary = $4, content = $5, \
             published_at = $6, modified_at = now() \
             WHERE id = $1 \
             RETURNING id, author_id, title, slug, summary, content, published_at, created_at, modified_at",
        )
        .bind(params.id)
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.summary)
        .bind(&params.content)
        .bind(params.published_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn replace_post_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        for tag_id in tag_ids {
            sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2)")
                .bind(post_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
