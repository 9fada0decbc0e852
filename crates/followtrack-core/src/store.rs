//! Persistence interface for tracked accounts.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::accounts::{NewTrackedAccount, TrackedAccount};

#[derive(Debug, Error)]
pub enum StoreError {
    /// An active tracker already exists for this owner and username.
    #[error("owner {owner_id} already tracks {username}")]
    Duplicate { owner_id: Uuid, username: String },

    #[error("tracked account {0} not found")]
    NotFound(i64),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Storage for [`TrackedAccount`] records.
///
/// Implementations must enforce uniqueness of `(owner_id, platform_username)`
/// among active records and report violations as [`StoreError::Duplicate`].
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// All active accounts, oldest first.
    async fn list_active(&self) -> Result<Vec<TrackedAccount>, StoreError>;

    async fn get_active(
        &self,
        owner_id: Uuid,
        username: &str,
    ) -> Result<Option<TrackedAccount>, StoreError>;

    async fn count_active_for_owner(&self, owner_id: Uuid) -> Result<usize, StoreError>;

    async fn insert(&self, account: NewTrackedAccount) -> Result<TrackedAccount, StoreError>;

    /// Whether record `id` exists and is still active.
    async fn is_active(&self, id: i64) -> Result<bool, StoreError>;

    /// Writes the fields a sync cycle may change: following count, following
    /// list, active flag, and `last_checked`.
    ///
    /// Only active records are written and a sync write never reactivates
    /// one. A record that is missing or was deactivated since it was read is
    /// reported as [`StoreError::NotFound`].
    async fn save_sync_state(&self, account: &TrackedAccount) -> Result<(), StoreError>;

    /// Soft-deletes an active tracker owned by `owner_id`.
    async fn deactivate(&self, id: i64, owner_id: Uuid) -> Result<(), StoreError>;
}

/// Cross-process exclusion for batch passes.
///
/// The in-process overlap guard only covers one engine; a lock taken through
/// this trait also covers engines living in other processes that share the
/// same store.
#[async_trait]
pub trait PassLock: Send + Sync {
    /// `Ok(None)` when another holder has the lock.
    async fn try_acquire(&self) -> Result<Option<Box<dyn PassLease>>, StoreError>;
}

/// A held [`PassLock`]. Dropping a lease without releasing it must still free
/// the lock eventually.
#[async_trait]
pub trait PassLease: Send {
    async fn release(self: Box<Self>);
}
