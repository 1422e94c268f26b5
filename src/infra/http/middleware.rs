use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::infra::cache::{RouteClass, should_store_response};
use crate::infra::http::api::ApiState;

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Serve successful GET responses out of the response cache. The cache key
/// varies on the Authorization header because the visible set depends on who
/// asks; everything else about the cache is invisible to handlers.
pub async fn response_cache(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.response_cache.enabled() || request.method() != Method::GET {
        return next.run(request).await;
    }

    let authorization = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let key = format!("{} {}\u{1}{authorization}", request.method(), request.uri());
    let class = classify_route(request.uri().path());

    if let Some(cached) = state.response_cache.get(&key).await {
        debug!(cache = "response", outcome = "hit", path = %request.uri().path(), "serving cached response");
        return cached;
    }

    let response = next.run(request).await;

    if !should_store_response(&response) {
        return response;
    }

    match state.response_cache.store(key, class, response).await {
        Ok(rebuilt) => rebuilt,
        Err(err) => {
            warn!(error = %err, "failed to buffer response for caching");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Collection routes expire faster than detail routes.
fn classify_route(path: &str) -> RouteClass {
    match path {
        "/api/v1/posts" | "/api/v1/posts/mine" | "/api/v1/tags" => RouteClass::List,
        _ if path.starts_with("/api/v1/posts/by-time/") => RouteClass::List,
        _ if path.ends_with("/posts") => RouteClass::List,
        _ => RouteClass::Detail,
    }
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "penna::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "request failed"
            );
        } else {
            warn!(
                target = "penna::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                request_id = request_id,
                "request rejected"
            );
        }
    }

    response
}
