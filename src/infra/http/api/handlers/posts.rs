//! Posts handlers.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::feed::FeedQuery;
use crate::application::pagination::{PageRequest, PostCursor};
use crate::application::posts::{CreatePostCommand, UpdatePostCommand};
use crate::application::repos::PostQueryFilter;
use crate::domain::types::{Actor, PostOrdering, TimeWindow};

use super::{comment_to_api, feed_to_api, page_to_response, post_to_api, tag_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

fn parse_feed_query(state: &ApiState, query: PostListQuery) -> Result<FeedQuery, ApiError> {
    let ordering = query
        .ordering
        .as_deref()
        .map(PostOrdering::parse)
        .transpose()
        .map_err(|err| ApiError::invalid_ordering(err.to_string()))?;

    let cursor = query
        .cursor
        .as_deref()
        .map(PostCursor::decode)
        .transpose()
        .map_err(|err| ApiError::invalid_cursor(err.to_string()))?;

    let limit = query.limit.unwrap_or(state.default_page_size).max(1);

    Ok(FeedQuery {
        filter: PostQueryFilter {
            tag: query.tag,
            search: query.search,
            author: None,
        },
        window: None,
        ordering,
        page: PageRequest::new(limit, cursor),
    })
}

pub async fn list_posts(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let feed_query = parse_feed_query(&state, query)?;
    let now = OffsetDateTime::now_utc();

    let page = state
        .feed
        .visible_posts(actor, feed_query, now)
        .await
        .map_err(feed_to_api)?;

    Ok(Json(page_to_response(&state, page).await?))
}

pub async fn list_posts_by_time(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path(period): Path<String>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut feed_query = parse_feed_query(&state, query)?;
    feed_query.window = Some(
        TimeWindow::parse(&period)
            .map_err(|err| ApiError::invalid_window(&err.token))?,
    );
    let now = OffsetDateTime::now_utc();

    let page = state
        .feed
        .visible_posts(actor, feed_query, now)
        .await
        .map_err(feed_to_api)?;

    Ok(Json(page_to_response(&state, page).await?))
}

pub async fn list_posts_mine(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = actor.user_id().ok_or_else(|| {
        ApiError::unauthorized("you must be logged in to see which posts are yours")
    })?;

    let feed_query = parse_feed_query(&state, query)?;
    let now = OffsetDateTime::now_utc();

    let page = state
        .feed
        .own_posts(actor, user_id, feed_query, now)
        .await
        .map_err(feed_to_api)?;

    Ok(Json(page_to_response(&state, page).await?))
}

pub async fn get_post(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let now = OffsetDateTime::now_utc();

    let post = state
        .feed
        .visible_post(actor, id, now)
        .await
        .map_err(feed_to_api)?
        .ok_or_else(|| ApiError::not_found("post not found"))?;

    let tags = state
        .tags
        .values_for_post(post.id)
        .await
        .map_err(tag_to_api)?;
    let comments = state
        .comments
        .for_post(post.id)
        .await
        .map_err(comment_to_api)?;

    Ok(Json(PostDetailResponse {
        post: PostResponse::from_record(post, tags),
        comments: comments.into_iter().map(CommentResponse::from).collect(),
    }))
}

pub async fn create_post(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<PostCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreatePostCommand {
        title: payload.title,
        slug: payload.slug,
        summary: payload.summary,
        content: payload.content,
        published_at: payload.published_at,
        tags: payload.tags,
    };

    let post = state
        .posts
        .create(actor, command)
        .await
        .map_err(post_to_api)?;

    let tags = state
        .tags
        .values_for_post(post.id)
        .await
        .map_err(tag_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse::from_record(post, tags)),
    ))
}

pub async fn update_post(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = OffsetDateTime::now_utc();

    let command = UpdatePostCommand {
        title: payload.title,
        slug: payload.slug,
        summary: payload.summary,
        content: payload.content,
        published_at: payload.published_at,
        tags: payload.tags,
    };

    let post = state
        .posts
        .update(actor, id, command, now)
        .await
        .map_err(post_to_api)?;

    let tags = state
        .tags
        .values_for_post(post.id)
        .await
        .map_err(tag_to_api)?;

    Ok(Json(PostResponse::from_record(post, tags)))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let now = OffsetDateTime::now_utc();

    state
        .posts
        .delete(actor, id, now)
        .await
        .map_err(post_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
