//! Tags handlers.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::feed::FeedQuery;
use crate::application::pagination::{PageRequest, PostCursor};
use crate::application::repos::PostQueryFilter;
use crate::domain::types::Actor;

use super::{feed_to_api, page_to_response, tag_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_tags(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.tags.list().await.map_err(tag_to_api)?;
    Ok(Json(
        tags.into_iter().map(TagResponse::from).collect::<Vec<_>>(),
    ))
}

pub async fn get_tag(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state.tags.get(id).await.map_err(tag_to_api)?;
    Ok(Json(TagResponse::from(tag)))
}

/// Visible posts carrying the tag, paginated like the main listing.
pub async fn list_tag_posts(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state.tags.get(id).await.map_err(tag_to_api)?;

    let cursor = query
        .cursor
        .as_deref()
        .map(PostCursor::decode)
        .transpose()
        .map_err(|err| ApiError::invalid_cursor(err.to_string()))?;
    let limit = query.limit.unwrap_or(state.default_page_size).max(1);

    let feed_query = FeedQuery {
        filter: PostQueryFilter {
            tag: Some(tag.value),
            search: None,
            author: None,
        },
        window: None,
        ordering: None,
        page: PageRequest::new(limit, cursor),
    };

    let now = OffsetDateTime::now_utc();
    let page = state
        .feed
        .visible_posts(actor, feed_query, now)
        .await
        .map_err(feed_to_api)?;

    Ok(Json(page_to_response(&state, page).await?))
}

pub async fn create_tag(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<TagCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .tags
        .create(actor, &payload.value)
        .await
        .map_err(tag_to_api)?;

    Ok((StatusCode::CREATED, Json(TagResponse::from(tag))))
}

pub async fn delete_tag(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.tags.delete(actor, id).await.map_err(tag_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
