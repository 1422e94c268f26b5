//! Users handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use super::user_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::UserResponse;
use crate::infra::http::api::state::ApiState;

pub async fn get_user(
    State(state): State<ApiState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.profile(&email).await.map_err(user_to_api)?;
    Ok(Json(UserResponse::from(user)))
}
