//! Cursor pagination
//!
//! The listing's "load more" was historically an unguarded fire-and-forget
//! fetch; a second trigger while one was in flight appended duplicate
//! pages. `Paginator` models it as a single-slot task instead: a trigger
//! that arrives while a fetch is outstanding is reported as `Busy` and
//! ignored, and once the cursor is gone no request ever leaves again.

use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use super::{ApiError, Client};
use crate::content::{Document, NormalizeError};

#[derive(Debug, Error)]
pub enum PaginateError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Outcome of a load-more trigger
#[derive(Debug)]
pub enum LoadMore {
    /// One page was fetched and normalized, in backend order
    Appended(Vec<Document>),
    /// The cursor was already exhausted; nothing was fetched
    Exhausted,
    /// A fetch is still outstanding; this trigger was dropped
    Busy,
}

/// Single-slot walker over a paginated query
#[derive(Debug)]
pub struct Paginator {
    cursor: Mutex<Option<Url>>,
}

impl Paginator {
    pub fn new(next_page: Option<Url>) -> Self {
        Self {
            cursor: Mutex::new(next_page),
        }
    }

    /// Fetch the next page, if any.
    ///
    /// Holds the slot for the duration of the fetch; concurrent triggers
    /// get `Busy`. On error the cursor is left untouched, so the same page
    /// can be retried by a later trigger.
    pub async fn load_more(&self, client: &Client) -> Result<LoadMore, PaginateError> {
        let mut cursor = match self.cursor.try_lock() {
            Ok(guard) => guard,
            Err(_) => return Ok(LoadMore::Busy),
        };

        let Some(url) = cursor.clone() else {
            return Ok(LoadMore::Exhausted);
        };

        let response = client.fetch_page(&url).await?;
        let documents = response
            .results
            .iter()
            .map(Document::from_raw)
            .collect::<Result<Vec<_>, _>>()?;

        *cursor = response.next_page;
        Ok(LoadMore::Appended(documents))
    }

    /// Follow the cursor to exhaustion and collect every document
    pub async fn drain(&self, client: &Client) -> Result<Vec<Document>, PaginateError> {
        let mut documents = Vec::new();
        loop {
            match self.load_more(client).await? {
                LoadMore::Appended(mut page) => documents.append(&mut page),
                LoadMore::Exhausted => return Ok(documents),
                // drain holds the only reference in practice; a busy slot
                // just means another trigger got there first
                LoadMore::Busy => return Ok(documents),
            }
        }
    }
}
