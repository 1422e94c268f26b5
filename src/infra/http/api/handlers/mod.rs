//! Request handlers plus the service-error → API-error mappings they share.

mod comments;
mod posts;
mod tags;
mod users;

pub use comments::create_comment;
pub use posts::{
    create_post, delete_post, get_post, list_posts, list_posts_by_time, list_posts_mine,
    update_post,
};
pub use tags::{create_tag, delete_tag, get_tag, list_tag_posts, list_tags};
pub use users::get_user;

use crate::application::comments::CommentError;
use crate::application::feed::FeedError;
use crate::application::pagination::{CursorPage, PaginationError};
use crate::application::posts::PostError;
use crate::application::repos::RepoError;
use crate::application::tags::TagError;
use crate::application::users::UserError;
use crate::domain::entities::PostRecord;
use crate::domain::slug::SlugError;

use super::error::ApiError;
use super::models::PostResponse;
use super::state::ApiState;

/// Attach each post's tag values and convert a page to its wire shape.
pub(crate) async fn page_to_response(
    state: &ApiState,
    page: CursorPage<PostRecord>,
) -> Result<CursorPage<PostResponse>, ApiError> {
    let mut items = Vec::with_capacity(page.items.len());
    for post in page.items {
        let tags = state
            .tags
            .values_for_post(post.id)
            .await
            .map_err(tag_to_api)?;
        items.push(PostResponse::from_record(post, tags));
    }

    Ok(CursorPage {
        items,
        next_cursor: page.next_cursor,
    })
}

pub(crate) fn repo_to_api(error: RepoError) -> ApiError {
    match error {
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::Duplicate { constraint } => ApiError::duplicate(constraint),
        RepoError::InvalidInput { message } => ApiError::bad_request("invalid input", Some(message)),
        RepoError::Timeout => ApiError::new(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            super::error::codes::DB_TIMEOUT,
            "database timeout",
            None,
        ),
        RepoError::Pagination(err) => pagination_to_api(err),
        RepoError::Persistence(message) => ApiError::new(
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            super::error::codes::REPO,
            "persistence error",
            Some(message),
        ),
    }
}

fn pagination_to_api(error: PaginationError) -> ApiError {
    match error {
        PaginationError::InvalidCursor(detail) => ApiError::invalid_cursor(detail),
    }
}

pub(crate) fn feed_to_api(error: FeedError) -> ApiError {
    match error {
        FeedError::InvalidWindow(err) => ApiError::invalid_window(&err.token),
        FeedError::InvalidOrdering(err) => ApiError::invalid_ordering(err.to_string()),
        FeedError::Pagination(err) => pagination_to_api(err),
        FeedError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn post_to_api(error: PostError) -> ApiError {
    match error {
        PostError::Unauthorized => ApiError::unauthorized("authentication required"),
        PostError::Forbidden => ApiError::forbidden("only the author or staff may modify a post"),
        PostError::NotFound => ApiError::not_found("post not found"),
        PostError::Validation(detail) => ApiError::validation(detail),
        PostError::Slug(SlugError::EmptyInput) => {
            ApiError::validation("cannot derive a slug from an empty title".to_string())
        }
        PostError::Slug(err) => ApiError::validation(err.to_string()),
        PostError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn comment_to_api(error: CommentError) -> ApiError {
    match error {
        CommentError::Unauthorized => {
            ApiError::unauthorized("you must be logged in to comment")
        }
        CommentError::PostNotFound => ApiError::not_found("post not found"),
        CommentError::Validation(detail) => ApiError::validation(detail),
        CommentError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn tag_to_api(error: TagError) -> ApiError {
    match error {
        TagError::Unauthorized => ApiError::unauthorized("authentication required"),
        TagError::Forbidden => ApiError::forbidden("staff access required"),
        TagError::NotFound => ApiError::not_found("tag not found"),
        TagError::Validation(detail) => ApiError::validation(detail),
        TagError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn user_to_api(error: UserError) -> ApiError {
    match error {
        UserError::NotFound => ApiError::not_found("user not found"),
        UserError::Repo(err) => repo_to_api(err),
    }
}
