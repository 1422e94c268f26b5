//! Cursor pagination over in-memory listings.
//!
//! Cursors are opaque URL-safe base64 payloads naming the ordering the page
//! was cut under and the last post the client saw. Listings are filtered and
//! sorted before pagination, so the cursor only has to find its position in
//! the final sequence; a cursor pointing at a post that has since left the
//! listing restarts from the beginning.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::PostRecord;
use crate::domain::types::PostOrdering;

pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct PostCursorPayload {
    ordering: Option<PostOrdering>,
    id: Uuid,
}

/// Cursor into a post listing: the ordering the listing was cut under plus
/// the id of the last post on the previous page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostCursor {
    ordering: Option<PostOrdering>,
    id: Uuid,
}

impl PostCursor {
    pub fn new(ordering: Option<PostOrdering>, id: Uuid) -> Self {
        Self { ordering, id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn encode(&self) -> String {
        let payload = PostCursorPayload {
            ordering: self.ordering,
            id: self.id,
        };
        let serialized =
            serde_json::to_vec(&payload).expect("serializing post cursor payload should succeed");
        URL_SAFE_NO_PAD.encode(serialized)
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let payload: PostCursorPayload = serde_json::from_slice(&bytes)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        Ok(Self {
            ordering: payload.ordering,
            id: payload.id,
        })
    }

    /// A cursor is only valid for the ordering it was cut under.
    fn check_ordering(&self, ordering: Option<PostOrdering>) -> Result<(), PaginationError> {
        if self.ordering == ordering {
            Ok(())
        } else {
            Err(PaginationError::InvalidCursor(
                "cursor ordering does not match the request".to_string(),
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PageRequest {
    pub limit: u32,
    pub cursor: Option<PostCursor>,
}

impl PageRequest {
    pub fn new(limit: u32, cursor: Option<PostCursor>) -> Self {
        Self { limit, cursor }
    }
}

/// One page of a listing plus the cursor for the next one, when more
/// remains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// Cut one page out of an already filtered and sorted listing.
pub fn paginate_posts(
    posts: Vec<PostRecord>,
    ordering: Option<PostOrdering>,
    page: PageRequest,
) -> Result<CursorPage<PostRecord>, PaginationError> {
    let limit = page.limit.clamp(1, MAX_PAGE_LIMIT) as usize;

    let start = match page.cursor {
        None => 0,
        Some(cursor) => {
            cursor.check_ordering(ordering)?;
            match posts.iter().position(|post| post.id == cursor.id()) {
                Some(index) => index + 1,
                None => 0,
            }
        }
    };

    let remaining = posts.len().saturating_sub(start);
    let items: Vec<PostRecord> = posts.into_iter().skip(start).take(limit).collect();

    let next_cursor = if remaining > limit {
        items
            .last()
            .map(|last| PostCursor::new(ordering, last.id).encode())
    } else {
        None
    };

    Ok(CursorPage { items, next_cursor })
}
