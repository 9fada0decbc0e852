//! Whole-collection listings built on [`collect_pages`].

use std::time::Duration;

use followtrack_core::clean_username;
use serde_json::Value;

use crate::api::SocialApi;
use crate::error::UpstreamError;
use crate::normalize::{normalize_media, normalize_usernames};
use crate::pagination::{collect_pages, PageLimits, DEFAULT_MAX_PAGES, RECENT_MEDIA_CAP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOptions {
    pub max_pages: usize,
    pub inter_page_delay: Duration,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            inter_page_delay: Duration::ZERO,
        }
    }
}

impl ListingOptions {
    fn uncapped(self) -> PageLimits {
        PageLimits {
            item_cap: None,
            max_pages: self.max_pages,
            inter_page_delay: self.inter_page_delay,
        }
    }
}

/// Every username `username` follows, in upstream order. Resolves the user
/// id first.
///
/// # Errors
///
/// Returns [`UpstreamError::MissingUserId`] when the id cannot be resolved,
/// or any error from [`fetch_following_by_id`].
pub async fn fetch_following<A>(
    api: &A,
    username: &str,
    options: ListingOptions,
) -> Result<Vec<String>, UpstreamError>
where
    A: SocialApi + ?Sized,
{
    let user_id = api.user_id(clean_username(username)).await?;
    fetch_following_by_id(api, &user_id, options).await
}

/// Every username the account with `user_id` follows.
///
/// # Errors
///
/// Propagates page errors and [`UpstreamError::PaginationExhausted`]; no
/// partial list is ever returned.
pub async fn fetch_following_by_id<A>(
    api: &A,
    user_id: &str,
    options: ListingOptions,
) -> Result<Vec<String>, UpstreamError>
where
    A: SocialApi + ?Sized,
{
    collect_pages(
        "following",
        options.uncapped(),
        |cursor| async move { api.following_page(user_id, cursor.as_deref()).await },
        normalize_usernames,
    )
    .await
}

/// Every follower of `username`.
///
/// # Errors
///
/// Same as [`fetch_following`].
pub async fn fetch_followers<A>(
    api: &A,
    username: &str,
    options: ListingOptions,
) -> Result<Vec<String>, UpstreamError>
where
    A: SocialApi + ?Sized,
{
    let user_id = api.user_id(clean_username(username)).await?;
    let user_id = user_id.as_str();
    collect_pages(
        "user_followers",
        options.uncapped(),
        |cursor| async move { api.followers_page(user_id, cursor.as_deref()).await },
        normalize_usernames,
    )
    .await
}

/// The most recent media items of `username`, at most [`RECENT_MEDIA_CAP`].
///
/// # Errors
///
/// Same as [`fetch_following`].
pub async fn fetch_recent_media<A>(
    api: &A,
    username: &str,
    options: ListingOptions,
) -> Result<Vec<Value>, UpstreamError>
where
    A: SocialApi + ?Sized,
{
    let user_id = api.user_id(clean_username(username)).await?;
    let user_id = user_id.as_str();
    let limits = PageLimits {
        item_cap: Some(RECENT_MEDIA_CAP),
        ..options.uncapped()
    };
    collect_pages(
        "feed",
        limits,
        |cursor| async move { api.media_page(user_id, cursor.as_deref()).await },
        normalize_media,
    )
    .await
}
