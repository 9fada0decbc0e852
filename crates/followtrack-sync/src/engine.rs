//! The per-account sync state machine and the batch pass that drives it.
//!
//! For each active account a pass checks the profile, deactivates accounts the
//! upstream reports as private or too large, diffs the following list (or the
//! following count when no list is available), notifies best-effort, and
//! persists the new state. Notification failure never blocks persistence, so a
//! detected change is announced at most once.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use followtrack_core::{
    AccountStore, Clock, NotificationGateway, PassLock, ProfileSnapshot, StoreError, TrackedAccount,
};
use followtrack_upstream::ProfileCheck;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::SyncError;
use crate::source::TrackerSource;

/// What one account's cycle ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountOutcome {
    Unchanged,
    ListChanged,
    CountChanged,
    FallbackSkipped,
    Deactivated,
    /// The owner untracked the account while the pass was working on it.
    Untracked,
    Failed,
}

/// Outcome counts for one batch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub unchanged: usize,
    pub list_changed: usize,
    pub count_changed: usize,
    pub fallback_skipped: usize,
    pub deactivated: usize,
    pub untracked: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn record(&mut self, outcome: AccountOutcome) {
        let slot = match outcome {
            AccountOutcome::Unchanged => &mut self.unchanged,
            AccountOutcome::ListChanged => &mut self.list_changed,
            AccountOutcome::CountChanged => &mut self.count_changed,
            AccountOutcome::FallbackSkipped => &mut self.fallback_skipped,
            AccountOutcome::Deactivated => &mut self.deactivated,
            AccountOutcome::Untracked => &mut self.untracked,
            AccountOutcome::Failed => &mut self.failed,
        };
        *slot += 1;
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.unchanged
            + self.list_changed
            + self.count_changed
            + self.fallback_skipped
            + self.deactivated
            + self.untracked
            + self.failed
    }
}

pub struct SyncEngine {
    source: Arc<dyn TrackerSource>,
    store: Arc<dyn AccountStore>,
    notifier: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
    inter_account_delay: Duration,
    running: Mutex<()>,
    pass_lock: Option<Arc<dyn PassLock>>,
}

impl SyncEngine {
    #[must_use]
    pub fn new(
        source: Arc<dyn TrackerSource>,
        store: Arc<dyn AccountStore>,
        notifier: Arc<dyn NotificationGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            clock,
            inter_account_delay: Duration::ZERO,
            running: Mutex::new(()),
            pass_lock: None,
        }
    }

    #[must_use]
    pub fn with_inter_account_delay(mut self, delay: Duration) -> Self {
        self.inter_account_delay = delay;
        self
    }

    /// Adds a lock shared with engines in other processes. A pass that cannot
    /// take it is refused like an in-process overlap.
    #[must_use]
    pub fn with_pass_lock(mut self, lock: Arc<dyn PassLock>) -> Self {
        self.pass_lock = Some(lock);
        self
    }

    /// True while a batch pass holds the overlap guard.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    /// Runs one pass over every active account, strictly sequentially.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadyRunning`] without doing any work when
    /// another pass holds the guard or the shared pass lock, or
    /// [`SyncError::Store`] when the lock or the active accounts cannot be
    /// read. Per-account failures are recorded in the report and never
    /// returned.
    pub async fn run_batch(&self) -> Result<BatchReport, SyncError> {
        let Ok(_guard) = self.running.try_lock() else {
            tracing::info!("sync: pass already running, skipping");
            return Err(SyncError::AlreadyRunning);
        };

        let Some(lock) = &self.pass_lock else {
            return self.run_pass().await;
        };
        let lease = match lock.try_acquire().await {
            Ok(Some(lease)) => lease,
            Ok(None) => {
                tracing::info!("sync: pass lock held by another process, skipping");
                return Err(SyncError::AlreadyRunning);
            }
            Err(e) => {
                tracing::error!(error = %e, "sync: failed to take the pass lock");
                return Err(e.into());
            }
        };

        let result = self.run_pass().await;
        lease.release().await;
        result
    }

    async fn run_pass(&self) -> Result<BatchReport, SyncError> {
        let accounts = self.store.list_active().await.map_err(|e| {
            tracing::error!(error = %e, "sync: failed to list active accounts");
            SyncError::from(e)
        })?;

        tracing::info!(count = accounts.len(), "sync: starting pass");
        let mut report = BatchReport::default();

        for (index, account) in accounts.into_iter().enumerate() {
            if index > 0 && !self.inter_account_delay.is_zero() {
                tokio::time::sleep(self.inter_account_delay).await;
            }
            let id = account.id;
            let username = account.platform_username.clone();
            let outcome = self.sync_account(account).await;
            tracing::info!(id, username = %username, ?outcome, "sync: account processed");
            report.record(outcome);
        }

        tracing::info!(?report, "sync: pass complete");
        Ok(report)
    }

    /// Runs the state machine for one account. Errors are logged here and
    /// turned into [`AccountOutcome::Failed`].
    pub async fn sync_account(&self, mut account: TrackedAccount) -> AccountOutcome {
        let username = account.platform_username.clone();

        let snapshot = match self.source.check_profile(&username).await {
            Ok(check) if check.is_unusable() => {
                return self.deactivate(account, &check).await;
            }
            Ok(check) => check.into_snapshot(),
            Err(e) => {
                tracing::warn!(
                    username = %username,
                    error = %e,
                    "sync: profile check failed, retrying with a direct read"
                );
                match self.source.read_profile(&username).await {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        tracing::error!(
                            username = %username,
                            error = %e,
                            "sync: profile unavailable this cycle"
                        );
                        account.last_checked = self.clock.now();
                        return self.persist(&account, AccountOutcome::Failed).await;
                    }
                }
            }
        };

        let listed = if account.count_only {
            None
        } else {
            self.try_list_mode(&mut account, &snapshot).await
        };
        let outcome = match listed {
            Some(outcome) => outcome,
            None => self.count_mode(&mut account, &snapshot).await,
        };

        account.last_checked = self.clock.now();
        self.persist(&account, outcome).await
    }

    async fn deactivate(&self, mut account: TrackedAccount, check: &ProfileCheck) -> AccountOutcome {
        let reason = rejection_reason(check);
        tracing::info!(
            id = account.id,
            username = %account.platform_username,
            reason = %reason,
            "sync: deactivating tracker"
        );

        account.is_active = false;
        account.last_checked = self.clock.now();
        self.persist(&account, AccountOutcome::Deactivated).await
    }

    /// `None` means the list was unavailable and this cycle falls back to
    /// count mode; the stored `count_only` flag is left alone.
    async fn try_list_mode(
        &self,
        account: &mut TrackedAccount,
        snapshot: &ProfileSnapshot,
    ) -> Option<AccountOutcome> {
        let username = account.platform_username.clone();
        let fetched = match self
            .source
            .following(&username, snapshot.user_id.as_deref())
            .await
        {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => {
                tracing::info!(username = %username, "sync: following list empty, using count mode");
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    username = %username,
                    error = %e,
                    "sync: following list unavailable, using count mode"
                );
                return None;
            }
        };

        let added = new_entries(&account.following_list, &fetched);
        if added.is_empty() {
            return Some(AccountOutcome::Unchanged);
        }

        tracing::info!(username = %username, added = added.len(), "sync: new follows detected");
        if let Some(outcome) = self.withdrawn(account).await {
            return Some(outcome);
        }
        if let Err(e) = self
            .notifier
            .notify_list_change(&username, &added, &account.notification_target)
            .await
        {
            tracing::error!(username = %username, error = %e, "sync: list-change notification failed");
        }

        account.following_list = fetched.into_iter().collect();
        account.current_following_count =
            u64::try_from(account.following_list.len()).unwrap_or(u64::MAX);
        Some(AccountOutcome::ListChanged)
    }

    async fn count_mode(&self, account: &mut TrackedAccount, snapshot: &ProfileSnapshot) -> AccountOutcome {
        if snapshot.is_fallback {
            tracing::debug!(
                username = %account.platform_username,
                "sync: fallback snapshot, skipping comparison"
            );
            return AccountOutcome::FallbackSkipped;
        }

        let old = account.current_following_count;
        let new = snapshot.following_count;
        if old == new {
            return AccountOutcome::Unchanged;
        }

        tracing::info!(
            username = %account.platform_username,
            old,
            new,
            "sync: following count changed"
        );
        if let Some(outcome) = self.withdrawn(account).await {
            return outcome;
        }
        if let Err(e) = self
            .notifier
            .notify_count_change(&account.platform_username, old, new, &account.notification_target)
            .await
        {
            tracing::error!(
                username = %account.platform_username,
                error = %e,
                "sync: count-change notification failed"
            );
        }

        account.current_following_count = new;
        AccountOutcome::CountChanged
    }

    /// Re-reads the active flag right before a notification goes out. `Some`
    /// stops the cycle without notifying and without touching the stored
    /// count or list.
    async fn withdrawn(&self, account: &TrackedAccount) -> Option<AccountOutcome> {
        match self.store.is_active(account.id).await {
            Ok(true) => None,
            Ok(false) => {
                tracing::info!(
                    id = account.id,
                    username = %account.platform_username,
                    "sync: tracker removed during the pass, change not announced"
                );
                Some(AccountOutcome::Untracked)
            }
            Err(e) => {
                tracing::error!(
                    id = account.id,
                    username = %account.platform_username,
                    error = %e,
                    "sync: could not confirm tracker is still active"
                );
                Some(AccountOutcome::Failed)
            }
        }
    }

    /// Saves the cycle's state and returns `outcome`, or what the write
    /// turned it into.
    async fn persist(&self, account: &TrackedAccount, outcome: AccountOutcome) -> AccountOutcome {
        match self.store.save_sync_state(account).await {
            Ok(()) => outcome,
            Err(StoreError::NotFound(_)) => {
                tracing::info!(
                    id = account.id,
                    username = %account.platform_username,
                    "sync: tracker removed during the pass, state not saved"
                );
                AccountOutcome::Untracked
            }
            Err(e) => {
                tracing::error!(
                    id = account.id,
                    username = %account.platform_username,
                    error = %e,
                    "sync: failed to persist account state"
                );
                AccountOutcome::Failed
            }
        }
    }
}

/// Human-readable reason a checked profile cannot be tracked.
pub(crate) fn rejection_reason(check: &ProfileCheck) -> String {
    match check {
        ProfileCheck::Private(_) => "profile is private".to_owned(),
        ProfileCheck::OverLimit { snapshot, limit } => format!(
            "following count {} exceeds limit {limit}",
            snapshot.following_count
        ),
        ProfileCheck::Usable(_) => "profile is usable".to_owned(),
    }
}

/// Entries of `fetched` missing from `stored`, in fetched order, without
/// duplicates.
fn new_entries(stored: &BTreeSet<String>, fetched: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut added = Vec::new();
    for name in fetched {
        if !stored.contains(name) && seen.insert(name.as_str()) {
            added.push(name.clone());
        }
    }
    added
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
