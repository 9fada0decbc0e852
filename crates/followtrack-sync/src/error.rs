use followtrack_core::StoreError;
use followtrack_upstream::UpstreamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("invalid username \"{0}\"")]
    InvalidUsername(String),

    #[error("maximum of {limit} trackers per owner reached")]
    TrackerLimit { limit: usize },

    #[error("{username} is already being tracked")]
    AlreadyTracked { username: String },

    #[error("{username} cannot be tracked: {reason}")]
    ProfileRejected { username: String, reason: String },

    /// Only a placeholder snapshot was available, so there is no real
    /// following count to seed the tracker with.
    #[error("profile for {username} is unavailable right now, try again later")]
    ProfileUnavailable { username: String },

    #[error("tracker {0} not found")]
    NotFound(i64),

    /// A batch pass was requested while another one was still running.
    #[error("a sync pass is already running")]
    AlreadyRunning,
}
