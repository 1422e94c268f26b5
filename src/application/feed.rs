//! Post listing service: candidate fetch, visibility, window, ordering,
//! pagination, in that order.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::{CursorPage, PageRequest, PaginationError, paginate_posts};
use crate::application::repos::{PostQueryFilter, PostsRepo, RepoError};
use crate::domain::entities::PostRecord;
use crate::domain::types::{Actor, InvalidOrdering, InvalidWindow, PostOrdering, TimeWindow};
use crate::domain::visibility;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    InvalidWindow(#[from] InvalidWindow),
    #[error(transparent)]
    InvalidOrdering(#[from] InvalidOrdering),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A fully parsed listing request.
#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub filter: PostQueryFilter,
    pub window: Option<TimeWindow>,
    pub ordering: Option<PostOrdering>,
    pub page: PageRequest,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
}

impl FeedService {
    pub fn new(posts: Arc<dyn PostsRepo>) -> Self {
        Self { posts }
    }

    /// The posts `actor` may see under `query`, one page at a time.
    pub async fn visible_posts(
        &self,
        actor: Actor,
        query: FeedQuery,
        now: OffsetDateTime,
    ) -> Result<CursorPage<PostRecord>, FeedError> {
        let candidates = self.posts.list_candidates(&query.filter).await?;
        let mut posts = visibility::select(candidates, actor, query.window, now);

        if let Some(ordering) = query.ordering {
            ordering.apply(&mut posts);
        }

        Ok(paginate_posts(posts, query.ordering, query.page)?)
    }

    /// The requester's own posts from the visible set. Callers guarantee the
    /// actor is authenticated; the author filter narrows the fetch.
    pub async fn own_posts(
        &self,
        actor: Actor,
        user_id: Uuid,
        mut query: FeedQuery,
        now: OffsetDateTime,
    ) -> Result<CursorPage<PostRecord>, FeedError> {
        query.filter.author = Some(user_id);
        self.visible_posts(actor, query, now).await
    }

    /// Detail lookup with object-level visibility: a post the actor may not
    /// see answers as if it did not exist.
    pub async fn visible_post(
        &self,
        actor: Actor,
        id: Uuid,
        now: OffsetDateTime,
    ) -> Result<Option<PostRecord>, FeedError> {
        let post = self.posts.find_by_id(id).await?;
        Ok(post.filter(|post| visibility::can_view(post, actor, now)))
    }
}
