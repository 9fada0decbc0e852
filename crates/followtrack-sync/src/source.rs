//! What the engine needs from the upstream, as one seam.

use std::sync::Arc;

use async_trait::async_trait;
use followtrack_core::ProfileSnapshot;
use followtrack_upstream::{
    fetch_following, fetch_following_by_id, ListingOptions, ProfileCheck, ProfileFetcher,
    SocialApi, UpstreamError,
};

#[async_trait]
pub trait TrackerSource: Send + Sync {
    /// Force-refreshed profile, classified for tracking.
    async fn check_profile(&self, username: &str) -> Result<ProfileCheck, UpstreamError>;

    /// Plain profile read, used as the second attempt when a check errors.
    async fn read_profile(&self, username: &str) -> Result<ProfileSnapshot, UpstreamError>;

    /// The complete following list. `user_id` skips the id lookup when the
    /// profile already carried one.
    async fn following(
        &self,
        username: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<String>, UpstreamError>;
}

/// [`TrackerSource`] backed by a cached [`ProfileFetcher`] and a [`SocialApi`].
///
/// Profile calls never fail here: the fetcher absorbs upstream errors into
/// stale or fallback snapshots.
pub struct UpstreamSource<A: SocialApi> {
    fetcher: ProfileFetcher<A>,
    listing: ListingOptions,
}

impl<A: SocialApi> UpstreamSource<A> {
    #[must_use]
    pub fn new(fetcher: ProfileFetcher<A>, listing: ListingOptions) -> Self {
        Self { fetcher, listing }
    }

    #[must_use]
    pub fn fetcher(&self) -> &ProfileFetcher<A> {
        &self.fetcher
    }

    fn api(&self) -> &Arc<A> {
        self.fetcher.api()
    }
}

#[async_trait]
impl<A: SocialApi + 'static> TrackerSource for UpstreamSource<A> {
    async fn check_profile(&self, username: &str) -> Result<ProfileCheck, UpstreamError> {
        Ok(self.fetcher.validate_profile(username).await)
    }

    async fn read_profile(&self, username: &str) -> Result<ProfileSnapshot, UpstreamError> {
        Ok(self.fetcher.fetch_profile(username, false).await)
    }

    async fn following(
        &self,
        username: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<String>, UpstreamError> {
        let api = self.api().as_ref();
        match user_id {
            Some(id) => fetch_following_by_id(api, id, self.listing).await,
            None => fetch_following(api, username, self.listing).await,
        }
    }
}
