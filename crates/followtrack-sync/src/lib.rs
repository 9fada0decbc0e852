//! Per-cycle synchronization of tracked accounts: profile checks, list and
//! count diffs, best-effort notification, and state persistence.

pub mod engine;
pub mod error;
pub mod notify;
pub mod registry;
pub mod schedule;
pub mod source;

#[cfg(test)]
mod testing;

pub use engine::{AccountOutcome, BatchReport, SyncEngine};
pub use error::SyncError;
pub use notify::{ChangeEvent, LogNotifier, WebhookNotifier};
pub use registry::{NewTracker, TrackerRegistry, DEFAULT_MAX_TRACKERS_PER_OWNER};
pub use schedule::{run_schedule, ChannelTicker, Ticker};
pub use source::{TrackerSource, UpstreamSource};
