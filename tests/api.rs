//! Router-level tests backed by in-memory repositories.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use penna::application::auth::AuthService;
use penna::application::comments::CommentService;
use penna::application::feed::FeedService;
use penna::application::posts::PostService;
use penna::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, PostQueryFilter, PostsRepo,
    PostsWriteRepo, RepoError, TagsRepo, TagsWriteRepo, UpdatePostParams, UsersRepo,
};
use penna::application::tags::TagService;
use penna::application::users::UserService;
use penna::domain::entities::{CommentRecord, PostRecord, TagRecord, UserRecord};
use penna::infra::cache::{ResponseCache, ResponseCacheConfig};
use penna::infra::http::ApiState;
use penna::infra::http::api::build_api_router;

#[derive(Default)]
struct InMemoryRepos {
    posts: Mutex<Vec<PostRecord>>,
    tags: Mutex<Vec<TagRecord>>,
    post_tags: Mutex<HashMap<Uuid, Vec<Uuid>>>,
    comments: Mutex<Vec<CommentRecord>>,
    users: Mutex<Vec<UserRecord>>,
}

impl InMemoryRepos {
    async fn insert_post(&self, post: PostRecord) {
        self.posts.lock().await.push(post);
    }

    async fn insert_user(&self, user: UserRecord) {
        self.users.lock().await.push(user);
    }

    async fn tag_post(&self, post_id: Uuid, tag_id: Uuid) {
        self.post_tags
            .lock()
            .await
            .entry(post_id)
            .or_default()
            .push(tag_id);
    }
}

#[async_trait]
impl PostsRepo for InMemoryRepos {
    async fn list_candidates(
        &self,
        filter: &PostQueryFilter,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let posts = self.posts.lock().await.clone();
        let post_tags = self.post_tags.lock().await.clone();
        let tags = self.tags.lock().await.clone();

        let tag_id = match filter.tag.as_deref() {
            None => None,
            Some(value) => match tags.iter().find(|tag| tag.value == value) {
                Some(tag) => Some(tag.id),
                None => return Ok(Vec::new()),
            },
        };

        Ok(posts
            .into_iter()
            .filter(|post| match tag_id {
                None => true,
                Some(tag_id) => post_tags
                    .get(&post.id)
                    .is_some_and(|ids| ids.contains(&tag_id)),
            })
            .filter(|post| match filter.author {
                None => true,
                Some(author) => post.author_id == author,
            })
            .filter(|post| match filter.search.as_deref() {
                None => true,
                Some(needle) => {
                    let needle = needle.to_lowercase();
                    post.title.to_lowercase().contains(&needle)
                        || post.summary.to_lowercase().contains(&needle)
                }
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.posts.lock().await.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        Ok(self
            .posts
            .lock()
            .await
            .iter()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        Ok(self.posts.lock().await.iter().any(|p| p.slug == slug))
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryRepos {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().await;
        if posts.iter().any(|p| p.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_key".to_string(),
            });
        }

        let now = OffsetDateTime::now_utc();
        let post = PostRecord {
            id: Uuid::new_v4(),
            author_id: params.author_id,
            title: params.title,
            slug: params.slug,
            summary: params.summary,
            content: params.content,
            published_at: params.published_at,
            created_at: now,
            modified_at: now,
        };
        posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;

        post.title = params.title;
        post.slug = params.slug;
        post.summary = params.summary;
        post.content = params.content;
        post.published_at = params.published_at;
        post.modified_at = OffsetDateTime::now_utc();
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.posts.lock().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn replace_post_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        self.post_tags
            .lock()
            .await
            .insert(post_id, tag_ids.to_vec());
        Ok(())
    }
}

#[async_trait]
impl TagsRepo for InMemoryRepos {
    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        let mut tags = self.tags.lock().await.clone();
        tags.sort_by(|a, b| a.value.cmp(&b.value));
        Ok(tags)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TagRecord>, RepoError> {
        Ok(self.tags.lock().await.iter().find(|t| t.id == id).cloned())
    }

    async fn values_for_post(&self, post_id: Uuid) -> Result<Vec<String>, RepoError> {
        let post_tags = self.post_tags.lock().await;
        let tags = self.tags.lock().await;
        let mut values: Vec<String> = post_tags
            .get(&post_id)
            .map(|ids| {
                tags.iter()
                    .filter(|tag| ids.contains(&tag.id))
                    .map(|tag| tag.value.clone())
                    .collect()
            })
            .unwrap_or_default();
        values.sort();
        Ok(values)
    }
}

#[async_trait]
impl TagsWriteRepo for InMemoryRepos {
    async fn ensure_tag(&self, value: &str) -> Result<TagRecord, RepoError> {
        let mut tags = self.tags.lock().await;
        if let Some(tag) = tags.iter().find(|t| t.value == value) {
            return Ok(tag.clone());
        }

        let tag = TagRecord {
            id: Uuid::new_v4(),
            value: value.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        tags.push(tag.clone());
        Ok(tag)
    }

    async fn create_tag(&self, value: &str) -> Result<TagRecord, RepoError> {
        let mut tags = self.tags.lock().await;
        if tags.iter().any(|t| t.value == value) {
            return Err(RepoError::Duplicate {
                constraint: "tags_value_key".to_string(),
            });
        }

        let tag = TagRecord {
            id: Uuid::new_v4(),
            value: value.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        tags.push(tag.clone());
        Ok(tag)
    }

    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tags = self.tags.lock().await;
        let before = tags.len();
        tags.retain(|t| t.id != id);
        if tags.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for InMemoryRepos {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        Ok(self
            .comments
            .lock()
            .await
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let comment = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            creator_id: params.creator_id,
            content: params.content,
            created_at: now,
            modified_at: now,
        };
        self.comments.lock().await.push(comment.clone());
        Ok(comment)
    }
}

#[async_trait]
impl UsersRepo for InMemoryRepos {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_token_digest(&self, digest: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.token_digest.as_deref() == Some(digest))
            .cloned())
    }
}

struct Harness {
    repos: Arc<InMemoryRepos>,
    router: Router,
    alice: UserRecord,
}

const ALICE_TOKEN: &str = "alice-token";
const BOB_TOKEN: &str = "bob-token";
const ROOT_TOKEN: &str = "root-token";

fn user(email: &str, is_staff: bool, token: &str) -> UserRecord {
    UserRecord {
        id: Uuid::new_v4(),
        email: email.to_string(),
        first_name: email.split('@').next().unwrap_or_default().to_string(),
        last_name: "Example".to_string(),
        is_staff,
        token_digest: Some(AuthService::token_digest(token)),
        created_at: OffsetDateTime::now_utc(),
    }
}

fn post(author: Uuid, slug: &str, published_at: Option<OffsetDateTime>) -> PostRecord {
    let created = OffsetDateTime::now_utc() - Duration::days(30);
    PostRecord {
        id: Uuid::new_v4(),
        author_id: author,
        title: format!("The {slug} post"),
        slug: slug.to_string(),
        summary: format!("Summary of {slug}"),
        content: format!("Content of {slug}"),
        published_at,
        created_at: created,
        modified_at: created,
    }
}

fn build_router_with_cache(repos: Arc<InMemoryRepos>, cache_enabled: bool) -> Router {
    let posts_repo: Arc<dyn PostsRepo> = repos.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repos.clone();
    let tags_repo: Arc<dyn TagsRepo> = repos.clone();
    let tags_write_repo: Arc<dyn TagsWriteRepo> = repos.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repos.clone();
    let users_repo: Arc<dyn UsersRepo> = repos.clone();

    let state = ApiState {
        auth: Arc::new(AuthService::new(users_repo.clone())),
        feed: Arc::new(FeedService::new(posts_repo.clone())),
        posts: Arc::new(PostService::new(
            posts_repo.clone(),
            posts_write_repo,
            tags_write_repo.clone(),
        )),
        tags: Arc::new(TagService::new(tags_repo, tags_write_repo)),
        comments: Arc::new(CommentService::new(comments_repo, posts_repo)),
        users: Arc::new(UserService::new(users_repo)),
        response_cache: Arc::new(ResponseCache::new(ResponseCacheConfig {
            enabled: cache_enabled,
            max_entries: std::num::NonZeroUsize::new(64).expect("non-zero"),
            list_ttl: StdDuration::from_secs(120),
            detail_ttl: StdDuration::from_secs(300),
        })),
        default_page_size: 10,
    };

    build_api_router(state)
}

/// Three users and four posts: two published by Bob, one scheduled into the
/// future and one draft, both by Alice.
async fn harness() -> Harness {
    let repos = Arc::new(InMemoryRepos::default());
    let now = OffsetDateTime::now_utc();

    let alice = user("alice@example.com", false, ALICE_TOKEN);
    let bob = user("bob@example.com", false, BOB_TOKEN);
    let root = user("root@example.com", true, ROOT_TOKEN);
    repos.insert_user(alice.clone()).await;
    repos.insert_user(bob.clone()).await;
    repos.insert_user(root).await;

    repos
        .insert_post(post(bob.id, "fresh", Some(now - Duration::minutes(30))))
        .await;
    repos
        .insert_post(post(bob.id, "older", Some(now - Duration::days(3))))
        .await;
    repos
        .insert_post(post(alice.id, "scheduled", Some(now + Duration::hours(2))))
        .await;
    repos.insert_post(post(alice.id, "draft", None)).await;

    let router = build_router_with_cache(repos.clone(), false);

    Harness {
        repos,
        router,
        alice,
    }
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

fn send_json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn item_slugs(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["slug"].as_str().expect("slug").to_string())
        .collect()
}

#[tokio::test]
async fn anonymous_listing_contains_only_published_posts() {
    let h = harness().await;

    let response = h.router.oneshot(get("/api/v1/posts", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["fresh", "older"]);
    assert!(body["next_cursor"].is_null());
}

#[tokio::test]
async fn author_sees_own_scheduled_and_draft_posts() {
    let h = harness().await;

    let response = h
        .router
        .clone()
        .oneshot(get("/api/v1/posts", Some(ALICE_TOKEN)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["fresh", "older", "scheduled", "draft"]);

    let response = h
        .router
        .oneshot(get("/api/v1/posts", Some(BOB_TOKEN)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["fresh", "older"]);
}

#[tokio::test]
async fn staff_listing_contains_every_post() {
    let h = harness().await;

    let response = h
        .router
        .oneshot(get("/api/v1/posts", Some(ROOT_TOKEN)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["fresh", "older", "scheduled", "draft"]);
}

#[tokio::test]
async fn time_windows_filter_published_posts() {
    let h = harness().await;

    let response = h
        .router
        .clone()
        .oneshot(get("/api/v1/posts/by-time/new", None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["items"][0]["slug"], "fresh");

    let response = h
        .router
        .clone()
        .oneshot(get("/api/v1/posts/by-time/week", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["fresh", "older"]);
}

#[tokio::test]
async fn window_filtering_never_resurrects_hidden_posts() {
    let h = harness().await;

    // Bob's listing today: Alice's scheduled post falls inside the window
    // but stays invisible to Bob.
    let response = h
        .router
        .oneshot(get("/api/v1/posts/by-time/today", Some(BOB_TOKEN)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let slugs = item_slugs(&body);
    assert!(!slugs.contains(&"scheduled".to_string()));
    assert!(!slugs.contains(&"draft".to_string()));
}

#[tokio::test]
async fn unknown_window_token_is_a_bad_request() {
    let h = harness().await;

    let response = h
        .router
        .oneshot(get("/api/v1/posts/by-time/fortnight", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "invalid_window");
    let hint = body["error"]["hint"].as_str().expect("hint");
    for token in ["new", "today", "week"] {
        assert!(hint.contains(token), "hint should name `{token}`: {hint}");
    }
}

#[tokio::test]
async fn ordering_sorts_the_visible_listing() {
    let h = harness().await;

    let response = h
        .router
        .clone()
        .oneshot(get("/api/v1/posts?ordering=slug", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["fresh", "older"]);

    let response = h
        .router
        .oneshot(get("/api/v1/posts?ordering=-slug", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["older", "fresh"]);
}

#[tokio::test]
async fn unknown_ordering_token_is_a_bad_request() {
    let h = harness().await;

    let response = h
        .router
        .oneshot(get("/api/v1/posts?ordering=karma", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "invalid_ordering");
}

#[tokio::test]
async fn listing_pages_chain_through_cursors() {
    let h = harness().await;

    let response = h
        .router
        .clone()
        .oneshot(get("/api/v1/posts?limit=1", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["fresh"]);
    let cursor = body["next_cursor"].as_str().expect("cursor").to_string();

    let response = h
        .router
        .oneshot(get(&format!("/api/v1/posts?limit=1&cursor={cursor}"), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["older"]);
    assert!(body["next_cursor"].is_null());
}

#[tokio::test]
async fn garbage_cursor_is_a_bad_request() {
    let h = harness().await;

    let response = h
        .router
        .oneshot(get("/api/v1/posts?cursor=%21%21%21", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "invalid_cursor");
}

#[tokio::test]
async fn mine_requires_authentication() {
    let h = harness().await;

    let response = h
        .router
        .clone()
        .oneshot(get("/api/v1/posts/mine", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = h
        .router
        .oneshot(get("/api/v1/posts/mine", Some(ALICE_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["scheduled", "draft"]);
}

#[tokio::test]
async fn invalid_token_is_rejected_outright() {
    let h = harness().await;

    let response = h
        .router
        .oneshot(get("/api/v1/posts", Some("no-such-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn hidden_post_detail_answers_not_found() {
    let h = harness().await;
    let draft_id = h
        .repos
        .find_by_slug("draft")
        .await
        .unwrap()
        .expect("draft exists")
        .id;

    let response = h
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/posts/{draft_id}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = h
        .router
        .oneshot(get(&format!("/api/v1/posts/{draft_id}"), Some(ALICE_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["slug"], "draft");
    assert!(body["comments"].as_array().expect("comments").is_empty());
}

#[tokio::test]
async fn creating_a_post_requires_authentication() {
    let h = harness().await;

    let payload = serde_json::json!({"title": "A new post"});
    let response = h
        .router
        .oneshot(send_json("POST", "/api/v1/posts", None, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_post_belongs_to_the_requester_and_derives_its_slug() {
    let h = harness().await;

    let payload = serde_json::json!({
        "title": "Borrow Checker Field Notes",
        "summary": "Lessons learned",
        "content": "Full text",
        "tags": ["Rust", "notes"]
    });
    let response = h
        .router
        .oneshot(send_json("POST", "/api/v1/posts", Some(ALICE_TOKEN), payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["slug"], "borrow-checker-field-notes");
    assert_eq!(body["author_id"], Value::String(h.alice.id.to_string()));
    assert_eq!(body["tags"], serde_json::json!(["notes", "rust"]));
}

#[tokio::test]
async fn duplicate_slug_conflicts() {
    let h = harness().await;

    let payload = serde_json::json!({"title": "Whatever", "slug": "fresh"});
    let response = h
        .router
        .oneshot(send_json("POST", "/api/v1/posts", Some(ALICE_TOKEN), payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "duplicate");
}

#[tokio::test]
async fn only_the_author_or_staff_may_update_a_post() {
    let h = harness().await;
    let fresh_id = h
        .repos
        .find_by_slug("fresh")
        .await
        .unwrap()
        .expect("post exists")
        .id;

    let payload = serde_json::json!({"title": "Hijacked", "content": "x"});
    let response = h
        .router
        .clone()
        .oneshot(send_json(
            "PUT",
            &format!("/api/v1/posts/{fresh_id}"),
            Some(ALICE_TOKEN),
            payload.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let payload = serde_json::json!({"title": "Edited by author", "content": "x"});
    let response = h
        .router
        .clone()
        .oneshot(send_json(
            "PUT",
            &format!("/api/v1/posts/{fresh_id}"),
            Some(BOB_TOKEN),
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["title"], "Edited by author");

    let payload = serde_json::json!({"title": "Edited by staff", "content": "x"});
    let response = h
        .router
        .oneshot(send_json(
            "PUT",
            &format!("/api/v1/posts/{fresh_id}"),
            Some(ROOT_TOKEN),
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn the_author_can_delete_their_post() {
    let h = harness().await;
    let fresh_id = h
        .repos
        .find_by_slug("fresh")
        .await
        .unwrap()
        .expect("post exists")
        .id;

    let mut request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/posts/{fresh_id}"));
    request = request.header(header::AUTHORIZATION, format!("Token {BOB_TOKEN}"));
    let response = h
        .router
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(h.repos.find_by_slug("fresh").await.unwrap().is_none());
}

#[tokio::test]
async fn commenting_requires_authentication_and_a_visible_post() {
    let h = harness().await;
    let fresh_id = h
        .repos
        .find_by_slug("fresh")
        .await
        .unwrap()
        .expect("post exists")
        .id;
    let draft_id = h
        .repos
        .find_by_slug("draft")
        .await
        .unwrap()
        .expect("draft exists")
        .id;

    let payload = serde_json::json!({"content": "Nice write-up"});
    let response = h
        .router
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/api/v1/posts/{fresh_id}/comments"),
            None,
            payload.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Bob cannot see Alice's draft, so commenting on it answers 404.
    let response = h
        .router
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/api/v1/posts/{draft_id}/comments"),
            Some(BOB_TOKEN),
            payload.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = h
        .router
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/api/v1/posts/{fresh_id}/comments"),
            Some(ALICE_TOKEN),
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = h
        .router
        .oneshot(get(&format!("/api/v1/posts/{fresh_id}"), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["comments"][0]["content"], "Nice write-up");
    assert_eq!(
        body["comments"][0]["creator_id"],
        Value::String(h.alice.id.to_string())
    );
}

#[tokio::test]
async fn tag_values_are_normalized_and_deletion_is_staff_only() {
    let h = harness().await;

    let payload = serde_json::json!({"value": "  Databases "});
    let response = h
        .router
        .clone()
        .oneshot(send_json("POST", "/api/v1/tags", Some(ALICE_TOKEN), payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["value"], "databases");
    let tag_id = body["id"].as_str().expect("id").to_string();

    let mut request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/tags/{tag_id}"));
    request = request.header(header::AUTHORIZATION, format!("Token {ALICE_TOKEN}"));
    let response = h
        .router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/tags/{tag_id}"));
    request = request.header(header::AUTHORIZATION, format!("Token {ROOT_TOKEN}"));
    let response = h
        .router
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn tag_posts_listing_respects_visibility() {
    let h = harness().await;

    let tag = h.repos.ensure_tag("rust").await.unwrap();
    let fresh = h.repos.find_by_slug("fresh").await.unwrap().unwrap();
    let draft = h.repos.find_by_slug("draft").await.unwrap().unwrap();
    h.repos.tag_post(fresh.id, tag.id).await;
    h.repos.tag_post(draft.id, tag.id).await;

    let response = h
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/tags/{}/posts", tag.id), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["fresh"]);

    let response = h
        .router
        .oneshot(get(
            &format!("/api/v1/tags/{}/posts", tag.id),
            Some(ALICE_TOKEN),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["fresh", "draft"]);
}

#[tokio::test]
async fn user_profile_exposes_only_public_fields() {
    let h = harness().await;

    let response = h
        .router
        .clone()
        .oneshot(get("/api/v1/users/alice@example.com", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["first_name"], "alice");
    assert!(body.get("token_digest").is_none());
    assert!(body.get("is_staff").is_none());

    let response = h
        .router
        .oneshot(get("/api/v1/users/nobody@example.com", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cached_listings_replay_within_the_ttl() {
    let repos = Arc::new(InMemoryRepos::default());
    let now = OffsetDateTime::now_utc();
    let author = user("carol@example.com", false, "carol-token");
    repos.insert_user(author.clone()).await;
    repos
        .insert_post(post(author.id, "cached", Some(now - Duration::hours(1))))
        .await;

    let router = build_router_with_cache(repos.clone(), true);

    let response = router
        .clone()
        .oneshot(get("/api/v1/posts", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["cached"]);

    // A write after the first read is invisible until the entry expires.
    repos
        .insert_post(post(author.id, "late", Some(now - Duration::minutes(5))))
        .await;

    let response = router
        .clone()
        .oneshot(get("/api/v1/posts", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["cached"]);

    // The cache varies on the Authorization header, so an authenticated
    // request bypasses the anonymous entry and sees the new post.
    let response = router
        .oneshot(get("/api/v1/posts", Some("carol-token")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(item_slugs(&body), ["cached", "late"]);
}
