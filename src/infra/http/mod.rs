pub mod api;
pub mod middleware;

pub use api::{ApiState, build_api_router};

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware as axum_middleware;
use axum::response::{IntoResponse, Response};
use axum::{Router, routing::get};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;
use crate::infra::db::PostgresRepositories;

/// Full HTTP surface: the versioned API plus the health probe, wrapped in the
/// shared request-context and response-logging middleware.
pub fn build_router(state: ApiState, db: Arc<PostgresRepositories>) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .with_state(db)
        .merge(build_api_router(state))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

async fn health(State(db): State<Arc<PostgresRepositories>>) -> Response {
    db_health_response(db.ping().await)
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
