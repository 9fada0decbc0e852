//! Cursor-driven page collection shared by every paginated endpoint.
//!
//! Collection is all-or-nothing: any page failure aborts the whole walk and
//! nothing gathered so far is returned.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::error::UpstreamError;
use crate::normalize::next_cursor;

/// Number of recent media items returned by the media listing.
pub const RECENT_MEDIA_CAP: usize = 12;

/// Page ceiling used when the caller does not configure one.
pub const DEFAULT_MAX_PAGES: usize = 200;

/// One raw response page and the cursor for the page after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub body: Value,
    pub next_cursor: Option<String>,
}

impl Page {
    /// Wraps a body, reading its cursor with the shared cursor paths.
    #[must_use]
    pub fn from_body(body: Value) -> Self {
        let next_cursor = next_cursor(&body);
        Self { body, next_cursor }
    }
}

/// Bounds for a single pagination walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Stop once this many items are gathered, truncating to exactly the cap.
    pub item_cap: Option<usize>,
    /// Fetching more pages than this is an error.
    pub max_pages: usize,
    /// Sleep between consecutive page requests.
    pub inter_page_delay: Duration,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            item_cap: None,
            max_pages: DEFAULT_MAX_PAGES,
            inter_page_delay: Duration::ZERO,
        }
    }
}

/// Walks pages starting from no cursor until a page reports no next cursor
/// or the item cap is reached.
///
/// `fetch_page` receives the cursor for the page to fetch; `extract` turns a
/// page body into items. Pages that yield no items but carry a cursor are
/// followed.
///
/// # Errors
///
/// Propagates the first error from `fetch_page`. Returns
/// [`UpstreamError::PaginationExhausted`] when the upstream hands back a
/// cursor it already returned, or when more than `limits.max_pages` pages
/// would be needed.
pub async fn collect_pages<T, F, Fut, X>(
    endpoint: &str,
    limits: PageLimits,
    mut fetch_page: F,
    extract: X,
) -> Result<Vec<T>, UpstreamError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page, UpstreamError>>,
    X: Fn(&Value) -> Vec<T>,
{
    let mut items: Vec<T> = Vec::new();
    let mut seen_cursors: HashSet<String> = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut page_count = 0usize;

    loop {
        page_count += 1;
        if page_count > limits.max_pages {
            return Err(UpstreamError::PaginationExhausted {
                endpoint: endpoint.to_owned(),
                reason: format!("more than {} pages", limits.max_pages),
            });
        }

        if page_count > 1 && !limits.inter_page_delay.is_zero() {
            tokio::time::sleep(limits.inter_page_delay).await;
        }

        let page = fetch_page(cursor.take()).await?;
        let page_items = extract(&page.body);
        tracing::debug!(
            endpoint,
            page = page_count,
            items = page_items.len(),
            has_next = page.next_cursor.is_some(),
            "fetched page"
        );
        items.extend(page_items);

        if let Some(cap) = limits.item_cap {
            if items.len() >= cap {
                items.truncate(cap);
                return Ok(items);
            }
        }

        match page.next_cursor {
            None => return Ok(items),
            Some(next) => {
                if !seen_cursors.insert(next.clone()) {
                    return Err(UpstreamError::PaginationExhausted {
                        endpoint: endpoint.to_owned(),
                        reason: format!("cursor {next:?} repeated"),
                    });
                }
                cursor = Some(next);
            }
        }
    }
}
