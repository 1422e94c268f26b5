//! Response cache collaborator: memoizes successful GET responses keyed by
//! request URL plus the Authorization header, each entry living for a fixed
//! TTL. The key varies on the Authorization header because what a request
//! may see depends on who asks. Handlers never see the cache; the middleware
//! in `infra::http` consults it transparently.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use bytes::Bytes;
use http_body_util::BodyExt;
use lru::LruCache;
use metrics::counter;
use thiserror::Error;
use tokio::sync::Mutex;

/// Route classes carry different TTLs: listings move faster than details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    List,
    Detail,
}

#[derive(Debug, Clone)]
pub struct ResponseCacheConfig {
    pub enabled: bool,
    pub max_entries: NonZeroUsize,
    pub list_ttl: Duration,
    pub detail_ttl: Duration,
}

impl ResponseCacheConfig {
    pub fn ttl_for(&self, class: RouteClass) -> Duration {
        match class {
            RouteClass::List => self.list_ttl,
            RouteClass::Detail => self.detail_ttl,
        }
    }
}

impl From<&crate::config::CacheSettings> for ResponseCacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        let max_entries = NonZeroUsize::new(settings.max_entries.get() as usize)
            .expect("cache capacity is validated as non-zero at load time");
        Self {
            enabled: settings.enabled,
            max_entries,
            list_ttl: settings.list_ttl,
            detail_ttl: settings.detail_ttl,
        }
    }
}

pub struct ResponseCache {
    config: ResponseCacheConfig,
    entries: Mutex<LruCache<String, CachedResponse>>,
}

impl ResponseCache {
    pub fn new(config: ResponseCacheConfig) -> Self {
        let entries = Mutex::new(LruCache::new(config.max_entries));
        Self { config, entries }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub async fn get(&self, key: &str) -> Option<Response> {
        let mut guard = self.entries.lock().await;
        match guard.get(key) {
            Some(entry) if !entry.expired() => {
                counter!("penna_response_cache_hit_total").increment(1);
                Some(entry.clone().into_response())
            }
            Some(_) => {
                guard.pop(key);
                counter!("penna_response_cache_expired_total").increment(1);
                counter!("penna_response_cache_miss_total").increment(1);
                None
            }
            None => {
                counter!("penna_response_cache_miss_total").increment(1);
                None
            }
        }
    }

    /// Buffer a response body, store the entry under `key`, and hand back a
    /// rebuilt response for the current caller. When buffering fails the
    /// response cannot be replayed and the error carries a bare 500.
    pub async fn store(
        &self,
        key: String,
        class: RouteClass,
        response: Response,
    ) -> Result<Response, CacheStoreError> {
        let (parts, body) = response.into_parts();
        let collected = body
            .collect()
            .await
            .map_err(|err| CacheStoreError::Buffer(err.to_string()))?;
        let bytes = collected.to_bytes();

        let cached = CachedResponse {
            status: parts.status,
            headers: parts
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            body: bytes.clone(),
            stored_at: Instant::now(),
            ttl: self.config.ttl_for(class),
        };

        {
            let mut guard = self.entries.lock().await;
            guard.put(key, cached);
        }
        counter!("penna_response_cache_store_total").increment(1);

        Ok(Response::from_parts(parts, Body::from(bytes)))
    }

    pub async fn invalidate_all(&self) {
        self.entries.lock().await.clear();
    }
}

#[derive(Clone)]
struct CachedResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
    stored_at: Instant,
    ttl: Duration,
}

impl CachedResponse {
    fn expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }

    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        headers.clear();
        for (name, value) in self.headers {
            headers.append(name, value);
        }

        response
    }
}

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("failed to buffer response body: {0}")]
    Buffer(String),
}

/// Only plain successful responses are worth replaying.
pub fn should_store_response(response: &Response) -> bool {
    use axum::http::header;

    response.status() == StatusCode::OK && !response.headers().contains_key(header::SET_COOKIE)
}
