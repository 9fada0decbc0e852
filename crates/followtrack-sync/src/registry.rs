//! Tracker registration and removal on behalf of an owner.

use std::sync::Arc;

use followtrack_core::{
    clean_username, is_valid_username, AccountStore, NewTrackedAccount, StoreError, TrackedAccount,
};
use uuid::Uuid;

use crate::engine::rejection_reason;
use crate::error::SyncError;
use crate::source::TrackerSource;

/// Default cap on active trackers per owner.
pub const DEFAULT_MAX_TRACKERS_PER_OWNER: usize = 3;

/// A registration request as the owner typed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTracker {
    pub owner_id: Uuid,
    /// May carry a leading `@`.
    pub username: String,
    pub notification_target: String,
}

pub struct TrackerRegistry {
    store: Arc<dyn AccountStore>,
    source: Arc<dyn TrackerSource>,
    max_per_owner: usize,
}

impl TrackerRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, source: Arc<dyn TrackerSource>) -> Self {
        Self {
            store,
            source,
            max_per_owner: DEFAULT_MAX_TRACKERS_PER_OWNER,
        }
    }

    #[must_use]
    pub fn with_max_per_owner(mut self, max_per_owner: usize) -> Self {
        self.max_per_owner = max_per_owner;
        self
    }

    /// Validates and stores a new tracker.
    ///
    /// Checks run in order: username format, the per-owner cap, an existing
    /// active tracker, then a forced profile check. New trackers start in
    /// count-only mode seeded with the profile's current following count.
    ///
    /// # Errors
    ///
    /// - [`SyncError::InvalidUsername`] for a malformed handle
    /// - [`SyncError::TrackerLimit`] when the owner is at the cap
    /// - [`SyncError::AlreadyTracked`] for a duplicate, including one that
    ///   loses an insert race
    /// - [`SyncError::ProfileRejected`] for private or oversized profiles
    /// - [`SyncError::ProfileUnavailable`] when the upstream only yields a
    ///   fallback snapshot
    /// - [`SyncError::Store`] / [`SyncError::Upstream`] for collaborator failures
    pub async fn register(&self, request: NewTracker) -> Result<TrackedAccount, SyncError> {
        if !is_valid_username(&request.username) {
            return Err(SyncError::InvalidUsername(request.username));
        }
        let username = clean_username(&request.username).to_owned();

        let active = self.store.count_active_for_owner(request.owner_id).await?;
        if active >= self.max_per_owner {
            return Err(SyncError::TrackerLimit {
                limit: self.max_per_owner,
            });
        }

        if self
            .store
            .get_active(request.owner_id, &username)
            .await?
            .is_some()
        {
            return Err(SyncError::AlreadyTracked { username });
        }

        let check = self.source.check_profile(&username).await?;
        if check.is_unusable() {
            return Err(SyncError::ProfileRejected {
                reason: rejection_reason(&check),
                username,
            });
        }
        let snapshot = check.into_snapshot();
        if snapshot.is_fallback {
            tracing::warn!(username = %username, "registry: profile unavailable, not registering");
            return Err(SyncError::ProfileUnavailable { username });
        }

        let created = self
            .store
            .insert(NewTrackedAccount {
                owner_id: request.owner_id,
                platform_username: username,
                notification_target: request.notification_target,
                current_following_count: snapshot.following_count,
                count_only: true,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { username, .. } => SyncError::AlreadyTracked { username },
                other => SyncError::Store(other),
            })?;

        tracing::info!(
            id = created.id,
            owner_id = %created.owner_id,
            username = %created.platform_username,
            following = created.current_following_count,
            "registry: tracker created"
        );
        Ok(created)
    }

    /// Soft-deletes an active tracker owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] when no active tracker with that id
    /// belongs to the owner.
    pub async fn deactivate(&self, id: i64, owner_id: Uuid) -> Result<(), SyncError> {
        self.store
            .deactivate(id, owner_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(id) => SyncError::NotFound(id),
                other => SyncError::Store(other),
            })
    }
}
