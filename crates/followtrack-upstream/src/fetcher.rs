//! Cache-backed profile fetching that always yields a usable snapshot.

use std::sync::Arc;

use followtrack_core::{clean_username, ProfileSnapshot};

use crate::api::SocialApi;
use crate::cache::ProfileCache;
use crate::error::UpstreamError;
use crate::normalize::normalize_profile;

/// Following counts above this make a profile too large to track.
pub const DEFAULT_MAX_TRACKED_FOLLOWING: u64 = 7500;

/// Classification of a freshly fetched profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileCheck {
    Usable(ProfileSnapshot),
    Private(ProfileSnapshot),
    OverLimit { snapshot: ProfileSnapshot, limit: u64 },
}

impl ProfileCheck {
    #[must_use]
    pub fn snapshot(&self) -> &ProfileSnapshot {
        match self {
            Self::Usable(snapshot) | Self::Private(snapshot) | Self::OverLimit { snapshot, .. } => {
                snapshot
            }
        }
    }

    #[must_use]
    pub fn into_snapshot(self) -> ProfileSnapshot {
        match self {
            Self::Usable(snapshot) | Self::Private(snapshot) | Self::OverLimit { snapshot, .. } => {
                snapshot
            }
        }
    }

    /// True when the upstream positively reported the profile as unusable.
    #[must_use]
    pub fn is_unusable(&self) -> bool {
        !matches!(self, Self::Usable(_))
    }
}

/// Fetches profiles through a shared [`ProfileCache`].
pub struct ProfileFetcher<A: SocialApi> {
    api: Arc<A>,
    cache: Arc<ProfileCache>,
    max_following: u64,
}

impl<A: SocialApi> ProfileFetcher<A> {
    #[must_use]
    pub fn new(api: Arc<A>, cache: Arc<ProfileCache>) -> Self {
        Self {
            api,
            cache,
            max_following: DEFAULT_MAX_TRACKED_FOLLOWING,
        }
    }

    #[must_use]
    pub fn with_following_limit(mut self, max_following: u64) -> Self {
        self.max_following = max_following;
        self
    }

    #[must_use]
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Returns a snapshot for `username`. Never fails.
    ///
    /// A fresh cache entry is returned untouched unless `force_refresh` is
    /// set. On upstream failure the last cached snapshot is returned without
    /// being re-stamped; with nothing cached, a fallback snapshot is cached
    /// and returned.
    pub async fn fetch_profile(&self, username: &str, force_refresh: bool) -> ProfileSnapshot {
        let key = clean_username(username);

        if !force_refresh {
            if let Some(cached) = self.cache.fresh(key) {
                tracing::debug!(username = %key, "profile: cache hit");
                return cached;
            }
        }

        match self.fetch_live(key).await {
            Ok(snapshot) => {
                self.cache.store(key, snapshot.clone());
                snapshot
            }
            Err(e) => {
                if let Some(stale) = self.cache.any(key) {
                    tracing::warn!(
                        username = %key,
                        error = %e,
                        "profile: fetch failed, serving cached snapshot"
                    );
                    return stale;
                }
                tracing::warn!(
                    username = %key,
                    error = %e,
                    "profile: fetch failed with nothing cached, using fallback"
                );
                let fallback = ProfileSnapshot::fallback(key, self.cache.now());
                self.cache.store(key, fallback.clone());
                fallback
            }
        }
    }

    /// Force-refreshes `username` and classifies the result. Fallback
    /// snapshots are always [`ProfileCheck::Usable`].
    pub async fn validate_profile(&self, username: &str) -> ProfileCheck {
        let snapshot = self.fetch_profile(username, true).await;
        classify(snapshot, self.max_following)
    }

    async fn fetch_live(&self, username: &str) -> Result<ProfileSnapshot, UpstreamError> {
        let body = self.api.profile(username).await?;
        let normalized = normalize_profile(&body).ok_or_else(|| UpstreamError::Unrecognized {
            endpoint: "profile".to_owned(),
            username: username.to_owned(),
        })?;
        Ok(ProfileSnapshot {
            username: normalized.username,
            is_private: normalized.is_private,
            following_count: normalized.following_count,
            user_id: normalized.user_id,
            is_fallback: false,
            fetched_at: self.cache.now(),
        })
    }
}

fn classify(snapshot: ProfileSnapshot, limit: u64) -> ProfileCheck {
    if snapshot.is_fallback {
        ProfileCheck::Usable(snapshot)
    } else if snapshot.is_private {
        ProfileCheck::Private(snapshot)
    } else if snapshot.following_count > limit {
        ProfileCheck::OverLimit { snapshot, limit }
    } else {
        ProfileCheck::Usable(snapshot)
    }
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod tests;
