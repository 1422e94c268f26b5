use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{RepoError, TagsRepo, TagsWriteRepo};
use crate::domain::entities::TagRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl TagsRepo for PostgresRepositories {
    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        sqlx::query_as::<_, TagRecord>("SELECT id, value, created_at FROM tags ORDER BY value")
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TagRecord>, RepoError> {
        sqlx::query_as::<_, TagRecord>("SELECT id, value, created_at FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn values_for_post(&self, post_id: Uuid) -> Result<Vec<String>, RepoError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT t.value FROM tags t \
             INNER JOIN post_tags pt ON pt.tag_id = t.id \
             WHERE pt.post_id = $1 ORDER BY t.value",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|(value,)| value).collect())
    }
}

#[async_trait]
impl TagsWriteRepo for PostgresRepositories {
    async fn ensure_tag(&self, value: &str) -> Result<TagRecord, RepoError> {
        sqlx::query_as::<_, TagRecord>(
            "INSERT INTO tags (id, value) VALUES ($1, $2) \
             ON CONFLICT (value) DO UPDATE SET value = EXCLUDED.value \
             RETURNING id, value, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(value)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_tag(&self, value: &str) -> Result<TagRecord, RepoError> {
        sqlx::query_as::<_, TagRecord>(
            "INSERT INTO tags (id, value) VALUES ($1, $2) RETURNING id, value, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(value)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
