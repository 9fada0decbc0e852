//! In-process [`AccountStore`] with the same uniqueness rules as Postgres.
//! Used by tests and by CLI dry runs.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use followtrack_core::{AccountStore, NewTrackedAccount, StoreError, TrackedAccount};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    accounts: BTreeMap<i64, TrackedAccount>,
}

#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    inner: Mutex<Inner>,
}

impl MemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store with fully formed accounts, keeping their ids.
    #[must_use]
    pub fn with_accounts(accounts: impl IntoIterator<Item = TrackedAccount>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for account in accounts {
                inner.next_id = inner.next_id.max(account.id);
                inner.accounts.insert(account.id, account);
            }
        }
        store
    }

    /// Every record, active or not, in id order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TrackedAccount> {
        self.lock().accounts.values().cloned().collect()
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<TrackedAccount> {
        self.lock().accounts.get(&id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_same_active(account: &TrackedAccount, owner_id: Uuid, username: &str) -> bool {
    account.is_active && account.owner_id == owner_id && account.platform_username == username
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn list_active(&self) -> Result<Vec<TrackedAccount>, StoreError> {
        Ok(self
            .lock()
            .accounts
            .values()
            .filter(|a| a.is_active)
            .cloned()
            .collect())
    }

    async fn get_active(
        &self,
        owner_id: Uuid,
        username: &str,
    ) -> Result<Option<TrackedAccount>, StoreError> {
        Ok(self
            .lock()
            .accounts
            .values()
            .find(|a| is_same_active(a, owner_id, username))
            .cloned())
    }

    async fn count_active_for_owner(&self, owner_id: Uuid) -> Result<usize, StoreError> {
        Ok(self
            .lock()
            .accounts
            .values()
            .filter(|a| a.is_active && a.owner_id == owner_id)
            .count())
    }

    async fn insert(&self, account: NewTrackedAccount) -> Result<TrackedAccount, StoreError> {
        let mut inner = self.lock();
        if inner
            .accounts
            .values()
            .any(|a| is_same_active(a, account.owner_id, &account.platform_username))
        {
            return Err(StoreError::Duplicate {
                owner_id: account.owner_id,
                username: account.platform_username,
            });
        }

        inner.next_id += 1;
        let now = Utc::now();
        let record = TrackedAccount {
            id: inner.next_id,
            owner_id: account.owner_id,
            platform_username: account.platform_username,
            notification_target: account.notification_target,
            current_following_count: account.current_following_count,
            following_list: std::collections::BTreeSet::new(),
            count_only: account.count_only,
            is_active: true,
            created_at: now,
            last_checked: now,
        };
        inner.accounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn is_active(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.lock().accounts.get(&id).is_some_and(|a| a.is_active))
    }

    async fn save_sync_state(&self, account: &TrackedAccount) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let stored = inner
            .accounts
            .get_mut(&account.id)
            .filter(|stored| stored.is_active)
            .ok_or(StoreError::NotFound(account.id))?;
        stored.current_following_count = account.current_following_count;
        stored.following_list = if stored.count_only {
            std::collections::BTreeSet::new()
        } else {
            account.following_list.clone()
        };
        stored.is_active = stored.is_active && account.is_active;
        stored.last_checked = account.last_checked;
        Ok(())
    }

    async fn deactivate(&self, id: i64, owner_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.lock();
        match inner.accounts.get_mut(&id) {
            Some(account) if account.is_active && account.owner_id == owner_id => {
                account.is_active = false;
                Ok(())
            }
            _ => Err(StoreError::NotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(owner_id: Uuid, username: &str) -> NewTrackedAccount {
        NewTrackedAccount {
            owner_id,
            platform_username: username.to_owned(),
            notification_target: "owner@example.com".to_owned(),
            current_following_count: 10,
            count_only: true,
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_rejects_active_duplicates() {
        let store = MemoryAccountStore::new();
        let owner = Uuid::new_v4();

        let first = store.insert(new_account(owner, "alice")).await.unwrap();
        let second = store.insert(new_account(owner, "bob")).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        assert!(first.is_active && first.count_only);

        let dup = store.insert(new_account(owner, "alice")).await;
        assert!(matches!(dup, Err(StoreError::Duplicate { .. })));

        // Another owner may track the same username.
        store.insert(new_account(Uuid::new_v4(), "alice")).await.unwrap();
    }

    #[tokio::test]
    async fn deactivated_tracker_frees_the_username() {
        let store = MemoryAccountStore::new();
        let owner = Uuid::new_v4();
        let account = store.insert(new_account(owner, "alice")).await.unwrap();

        store.deactivate(account.id, owner).await.unwrap();
        assert!(store.list_active().await.unwrap().is_empty());
        assert_eq!(store.count_active_for_owner(owner).await.unwrap(), 0);
        assert!(store.get_active(owner, "alice").await.unwrap().is_none());

        store.insert(new_account(owner, "alice")).await.unwrap();
        assert_eq!(store.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn deactivate_checks_owner() {
        let store = MemoryAccountStore::new();
        let owner = Uuid::new_v4();
        let account = store.insert(new_account(owner, "alice")).await.unwrap();

        let err = store.deactivate(account.id, Uuid::new_v4()).await;
        assert!(matches!(err, Err(StoreError::NotFound(id)) if id == account.id));
        assert!(store.get(account.id).unwrap().is_active);
    }

    #[tokio::test]
    async fn save_sync_state_writes_only_sync_fields() {
        let store = MemoryAccountStore::new();
        let owner = Uuid::new_v4();
        let mut list_mode = new_account(owner, "alice");
        list_mode.count_only = false;
        let mut account = store.insert(list_mode).await.unwrap();

        account.current_following_count = 2;
        account.following_list = ["x", "y"].into_iter().map(String::from).collect();
        account.notification_target = "changed@example.com".to_owned();
        store.save_sync_state(&account).await.unwrap();

        let stored = store.get(account.id).unwrap();
        assert_eq!(stored.current_following_count, 2);
        assert_eq!(stored.following_list.len(), 2);
        assert_eq!(stored.notification_target, "owner@example.com");
    }

    #[tokio::test]
    async fn count_only_record_keeps_an_empty_list() {
        let store = MemoryAccountStore::new();
        let mut account = store.insert(new_account(Uuid::new_v4(), "bob")).await.unwrap();

        account.count_only = false;
        account.following_list = ["x"].into_iter().map(String::from).collect();
        store.save_sync_state(&account).await.unwrap();

        let stored = store.get(account.id).unwrap();
        assert!(stored.count_only, "count_only is not a sync field");
        assert!(stored.following_list.is_empty());
    }

    #[tokio::test]
    async fn save_sync_state_unknown_id_is_not_found() {
        let store = MemoryAccountStore::new();
        let ghost = TrackedAccount {
            id: 99,
            owner_id: Uuid::new_v4(),
            platform_username: "ghost".to_owned(),
            notification_target: String::new(),
            current_following_count: 0,
            following_list: std::collections::BTreeSet::new(),
            count_only: true,
            is_active: true,
            created_at: Utc::now(),
            last_checked: Utc::now(),
        };
        assert!(matches!(
            store.save_sync_state(&ghost).await,
            Err(StoreError::NotFound(99))
        ));
    }

    #[tokio::test]
    async fn sync_write_never_reactivates_a_deactivated_record() {
        let store = MemoryAccountStore::new();
        let owner = Uuid::new_v4();
        let mut stale = store.insert(new_account(owner, "alice")).await.unwrap();
        assert!(store.is_active(stale.id).await.unwrap());

        store.deactivate(stale.id, owner).await.unwrap();
        assert!(!store.is_active(stale.id).await.unwrap());

        stale.current_following_count = 11;
        stale.last_checked = Utc::now();
        let err = store.save_sync_state(&stale).await;

        assert!(matches!(err, Err(StoreError::NotFound(id)) if id == stale.id));
        let stored = store.get(stale.id).unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.current_following_count, 10);
    }

    #[tokio::test]
    async fn sync_write_can_deactivate() {
        let store = MemoryAccountStore::new();
        let mut account = store.insert(new_account(Uuid::new_v4(), "alice")).await.unwrap();

        account.is_active = false;
        store.save_sync_state(&account).await.unwrap();

        assert!(!store.get(account.id).unwrap().is_active);
        assert!(!store.is_active(account.id).await.unwrap());
        assert!(!store.is_active(404).await.unwrap());
    }
}
