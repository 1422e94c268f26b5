use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::auth::AuthError;
use crate::domain::types::Actor;

use super::error::ApiError;
use super::state::ApiState;

/// Derive the request's [`Actor`] from the token header, when one is
/// presented. Requests without credentials proceed as [`Actor::Anonymous`];
/// a presented-but-invalid token is rejected outright.
pub async fn derive_actor(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = extract_token(request.headers().get(axum::http::header::AUTHORIZATION));

    let actor = match token {
        None => Actor::Anonymous,
        Some(token) => match state.auth.authenticate(&token).await {
            Ok(actor) => actor,
            Err(AuthError::Invalid) => {
                return ApiError::unauthorized("invalid token").into_response();
            }
            Err(AuthError::Repo(err)) => {
                return super::handlers::repo_to_api(err).into_response();
            }
        },
    };

    request.extensions_mut().insert(actor);

    next.run(request).await
}

/// Accept both `Token <value>` (the original deployment's scheme) and
/// `Bearer <value>`.
fn extract_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let token = raw
        .strip_prefix("Token ")
        .or_else(|| raw.strip_prefix("Bearer "))?;
    Some(token.to_string())
}
