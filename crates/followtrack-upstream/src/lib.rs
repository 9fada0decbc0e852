//! Client, response normalization, pagination, and profile caching for the
//! upstream social-profile API.

pub mod api;
pub mod cache;
pub mod client;
pub mod error;
pub mod fetcher;
pub mod listing;
pub mod normalize;
pub mod pagination;
mod rate_limit;
#[cfg(test)]
mod stub;

pub use api::SocialApi;
pub use cache::ProfileCache;
pub use client::RapidApiClient;
pub use error::UpstreamError;
pub use fetcher::{ProfileCheck, ProfileFetcher, DEFAULT_MAX_TRACKED_FOLLOWING};
pub use listing::{fetch_followers, fetch_following, fetch_following_by_id, fetch_recent_media, ListingOptions};
pub use normalize::{normalize_profile, normalize_usernames, NormalizedProfile};
pub use pagination::{collect_pages, Page, PageLimits, DEFAULT_MAX_PAGES, RECENT_MEDIA_CAP};
