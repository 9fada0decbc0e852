//! Outbound notification interface.
//!
//! Delivery is best-effort: the sync engine logs failures and never retries
//! them within a cycle.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport error: {0}")]
    Transport(String),

    #[error("notification rejected with status {status}")]
    Rejected { status: u16 },
}

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// `new_usernames` holds every username followed since the last sync.
    async fn notify_list_change(
        &self,
        username: &str,
        new_usernames: &[String],
        target: &str,
    ) -> Result<(), NotifyError>;

    async fn notify_count_change(
        &self,
        username: &str,
        old_count: u64,
        new_count: u64,
        target: &str,
    ) -> Result<(), NotifyError>;
}
