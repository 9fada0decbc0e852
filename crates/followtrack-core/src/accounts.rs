//! Tracked accounts and the transient profile snapshots they are compared against.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker character users commonly type in front of a handle.
const USERNAME_MARKER: char = '@';

/// A monitored profile and the state recorded at its last sync.
///
/// `following_list` is authoritative only when `count_only` is false, and is
/// kept empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAccount {
    pub id: i64,
    pub owner_id: Uuid,
    pub platform_username: String,
    pub notification_target: String,
    pub current_following_count: u64,
    pub following_list: BTreeSet<String>,
    pub count_only: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_checked: DateTime<Utc>,
}

/// Payload for creating a tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrackedAccount {
    pub owner_id: Uuid,
    pub platform_username: String,
    pub notification_target: String,
    pub current_following_count: u64,
    pub count_only: bool,
}

/// Normalized view of one upstream profile fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub username: String,
    pub is_private: bool,
    pub following_count: u64,
    pub user_id: Option<String>,
    /// True when no real data could be obtained and this snapshot was synthesized.
    pub is_fallback: bool,
    pub fetched_at: DateTime<Utc>,
}

impl ProfileSnapshot {
    /// Synthesized placeholder used when the upstream could not be read and
    /// nothing was cached.
    #[must_use]
    pub fn fallback(username: &str, fetched_at: DateTime<Utc>) -> Self {
        Self {
            username: username.to_owned(),
            is_private: false,
            following_count: 0,
            user_id: None,
            is_fallback: true,
            fetched_at,
        }
    }
}

/// Strips a single leading `@` and surrounding whitespace; case is preserved.
#[must_use]
pub fn clean_username(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_prefix(USERNAME_MARKER).unwrap_or(trimmed)
}

/// Accepts `[A-Za-z0-9._]+` with an optional leading `@`.
#[must_use]
pub fn is_valid_username(raw: &str) -> bool {
    let cleaned = clean_username(raw);
    !cleaned.is_empty()
        && cleaned
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}
