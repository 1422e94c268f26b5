use std::sync::Arc;

use crate::application::auth::AuthService;
use crate::application::comments::CommentService;
use crate::application::feed::FeedService;
use crate::application::posts::PostService;
use crate::application::tags::TagService;
use crate::application::users::UserService;
use crate::infra::cache::ResponseCache;

#[derive(Clone)]
pub struct ApiState {
    pub auth: Arc<AuthService>,
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub tags: Arc<TagService>,
    pub comments: Arc<CommentService>,
    pub users: Arc<UserService>,
    pub response_cache: Arc<ResponseCache>,
    pub default_page_size: u32,
}
