//! Closed request-classification types shared across the crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::PostRecord;

/// The requesting identity, derived once per request by the authentication
/// boundary. Exactly one variant applies; downstream code matches
/// exhaustively instead of probing for attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Authenticated { user_id: Uuid },
    Staff { user_id: Uuid },
}

impl Actor {
    pub fn for_user(user_id: Uuid, is_staff: bool) -> Self {
        if is_staff {
            Actor::Staff { user_id }
        } else {
            Actor::Authenticated { user_id }
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated { user_id } | Actor::Staff { user_id } => Some(*user_id),
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Actor::Staff { .. })
    }

    /// Write access: the post's author and staff may modify, everyone else
    /// is read-only.
    pub fn may_modify(&self, post: &PostRecord) -> bool {
        match self {
            Actor::Anonymous => false,
            Actor::Staff { .. } => true,
            Actor::Authenticated { user_id } => post.author_id == *user_id,
        }
    }
}

/// A named recency filter applied to already-visible posts.
///
/// `Today` compares calendar dates in UTC; the server's local timezone never
/// participates in window arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    /// Published within the last hour.
    New,
    /// Published on the current UTC calendar date.
    Today,
    /// Published within the last seven days.
    Week,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{token}` is not a valid time window, expected one of: new, today, week")]
pub struct InvalidWindow {
    pub token: String,
}

impl TimeWindow {
    pub const VALID_TOKENS: [&'static str; 3] = ["new", "today", "week"];

    pub fn parse(token: &str) -> Result<Self, InvalidWindow> {
        match token {
            "new" => Ok(TimeWindow::New),
            "today" => Ok(TimeWindow::Today),
            "week" => Ok(TimeWindow::Week),
            other => Err(InvalidWindow {
                token: other.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::New => "new",
            TimeWindow::Today => "today",
            TimeWindow::Week => "week",
        }
    }
}

/// Sort key for an already-filtered listing. Applied after visibility and
/// window filtering as a separate stage; absent ordering keeps storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingKey {
    PublishedAt,
    Author,
    Title,
    Slug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOrdering {
    pub key: OrderingKey,
    pub descending: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{token}` is not a valid ordering, expected one of: published_at, author, title, slug")]
pub struct InvalidOrdering {
    pub token: String,
}

impl PostOrdering {
    /// Parse a query token such as `published_at` or `-title`; a leading `-`
    /// requests descending order.
    pub fn parse(token: &str) -> Result<Self, InvalidOrdering> {
        let (descending, name) = match token.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, token),
        };

        let key = match name {
            "published_at" => OrderingKey::PublishedAt,
            "author" => OrderingKey::Author,
            "title" => OrderingKey::Title,
            "slug" => OrderingKey::Slug,
            _ => {
                return Err(InvalidOrdering {
                    token: token.to_string(),
                });
            }
        };

        Ok(Self { key, descending })
    }

    /// Sort `posts` in place. Draft posts (no `published_at`) sort after
    /// dated posts under `published_at` ordering; ties always break by id so
    /// the resulting order is total.
    pub fn apply(self, posts: &mut [PostRecord]) {
        posts.sort_by(|a, b| {
            let ordering = match self.key {
                OrderingKey::PublishedAt => match (a.published_at, b.published_at) {
                    (Some(left), Some(right)) => left.cmp(&right),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                },
                OrderingKey::Author => a.author_id.cmp(&b.author_id),
                OrderingKey::Title => a.title.cmp(&b.title),
                OrderingKey::Slug => a.slug.cmp(&b.slug),
            };
            let ordering = if self.descending {
                ordering.reverse()
            } else {
                ordering
            };
            ordering.then_with(|| a.id.cmp(&b.id))
        });
    }
}
