//! Comments handlers.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::Actor;

use super::comment_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{CommentCreateRequest, CommentResponse};
use crate::infra::http::api::state::ApiState;

pub async fn create_comment(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CommentCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = OffsetDateTime::now_utc();

    let comment = state
        .comments
        .create(actor, post_id, payload.content, now)
        .await
        .map_err(comment_to_api)?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}
