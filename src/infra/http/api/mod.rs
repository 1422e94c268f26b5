pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::middleware::response_cache;

pub fn build_api_router(state: ApiState) -> Router {
    let auth_state = state.clone();
    let cache_state = state.clone();

    Router::new()
        .route(
            "/api/v1/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route("/api/v1/posts/mine", get(handlers::list_posts_mine))
        .route(
            "/api/v1/posts/by-time/{period}",
            get(handlers::list_posts_by_time),
        )
        .route(
            "/api/v1/posts/{id}",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route(
            "/api/v1/posts/{id}/comments",
            post(handlers::create_comment),
        )
        .route(
            "/api/v1/tags",
            get(handlers::list_tags).post(handlers::create_tag),
        )
        .route(
            "/api/v1/tags/{id}",
            get(handlers::get_tag).delete(handlers::delete_tag),
        )
        .route("/api/v1/tags/{id}/posts", get(handlers::list_tag_posts))
        .route("/api/v1/users/{email}", get(handlers::get_user))
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::derive_actor,
        ))
        .layer(axum_middleware::from_fn_with_state(
            cache_state,
            response_cache,
        ))
}
