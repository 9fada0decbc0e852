//! Short-lived, per-process profile cache keyed by username.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use followtrack_core::{Clock, ProfileSnapshot};

#[derive(Debug, Clone)]
struct CachedProfile {
    snapshot: ProfileSnapshot,
    stored_at: DateTime<Utc>,
}

/// Profile snapshots with a freshness window. Entries never expire on their
/// own: a stale entry stays available through [`ProfileCache::any`] so a
/// failed fetch can fall back to it.
pub struct ProfileCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CachedProfile>>,
}

impl std::fmt::Debug for ProfileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl ProfileCache {
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The entry for `username` if it was stored less than `ttl` ago.
    pub fn fresh(&self, username: &str) -> Option<ProfileSnapshot> {
        let now = self.clock.now();
        self.lock()
            .get(username)
            .filter(|entry| {
                // A negative age (clock moved backwards) counts as fresh.
                now.signed_duration_since(entry.stored_at)
                    .to_std()
                    .map_or(true, |age| age < self.ttl)
            })
            .map(|entry| entry.snapshot.clone())
    }

    /// The entry for `username` regardless of age.
    pub fn any(&self, username: &str) -> Option<ProfileSnapshot> {
        self.lock().get(username).map(|entry| entry.snapshot.clone())
    }

    pub fn store(&self, username: &str, snapshot: ProfileSnapshot) {
        let stored_at = self.clock.now();
        self.lock().insert(
            username.to_owned(),
            CachedProfile {
                snapshot,
                stored_at,
            },
        );
    }

    /// Current time on the cache's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedProfile>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
