//! Scripted collaborators for engine, registry, and schedule tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use followtrack_core::{
    NotificationGateway, NotifyError, PassLease, PassLock, ProfileSnapshot, StoreError, TrackedAccount,
};
use followtrack_upstream::{ProfileCheck, UpstreamError};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::source::TrackerSource;

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().unwrap()
}

pub(crate) fn snapshot(username: &str, following_count: u64) -> ProfileSnapshot {
    ProfileSnapshot {
        username: username.to_owned(),
        is_private: false,
        following_count,
        user_id: Some(format!("id-{username}")),
        is_fallback: false,
        fetched_at: t0(),
    }
}

pub(crate) fn account(
    id: i64,
    username: &str,
    count: u64,
    list: &[&str],
    count_only: bool,
) -> TrackedAccount {
    TrackedAccount {
        id,
        owner_id: Uuid::nil(),
        platform_username: username.to_owned(),
        notification_target: format!("{username}-owner@example.com"),
        current_following_count: count,
        following_list: list.iter().map(|s| (*s).to_owned()).collect(),
        count_only,
        is_active: true,
        created_at: t0(),
        last_checked: t0(),
    }
}

fn scripted_failure(username: &str) -> UpstreamError {
    UpstreamError::Api {
        endpoint: "profile".to_owned(),
        message: format!("scripted failure for {username}"),
    }
}

enum ProfileScript {
    Check(ProfileCheck),
    CheckFails { read: Option<ProfileSnapshot> },
}

#[derive(Default)]
pub(crate) struct ScriptedSource {
    profiles: Mutex<HashMap<String, ProfileScript>>,
    following: Mutex<HashMap<String, Option<Vec<String>>>>,
    gate: Option<Arc<Notify>>,
    pub(crate) check_calls: AtomicUsize,
    pub(crate) following_calls: AtomicUsize,
}

impl ScriptedSource {
    /// Every `check_profile` call waits for a permit on `gate` first.
    pub(crate) fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub(crate) fn set_check(&self, username: &str, check: ProfileCheck) {
        self.profiles
            .lock()
            .unwrap()
            .insert(username.to_owned(), ProfileScript::Check(check));
    }

    pub(crate) fn set_profile(&self, username: &str, following_count: u64) {
        self.set_check(username, ProfileCheck::Usable(snapshot(username, following_count)));
    }

    /// The check errors; the direct read returns `read`, or errors too.
    pub(crate) fn fail_check(&self, username: &str, read: Option<ProfileSnapshot>) {
        self.profiles
            .lock()
            .unwrap()
            .insert(username.to_owned(), ProfileScript::CheckFails { read });
    }

    pub(crate) fn set_following(&self, username: &str, list: &[&str]) {
        self.following.lock().unwrap().insert(
            username.to_owned(),
            Some(list.iter().map(|s| (*s).to_owned()).collect()),
        );
    }

    pub(crate) fn fail_following(&self, username: &str) {
        self.following.lock().unwrap().insert(username.to_owned(), None);
    }
}

#[async_trait]
impl TrackerSource for ScriptedSource {
    async fn check_profile(&self, username: &str) -> Result<ProfileCheck, UpstreamError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.profiles.lock().unwrap().get(username) {
            Some(ProfileScript::Check(check)) => Ok(check.clone()),
            Some(ProfileScript::CheckFails { .. }) | None => Err(scripted_failure(username)),
        }
    }

    async fn read_profile(&self, username: &str) -> Result<ProfileSnapshot, UpstreamError> {
        match self.profiles.lock().unwrap().get(username) {
            Some(ProfileScript::CheckFails { read: Some(snapshot) }) => Ok(snapshot.clone()),
            Some(ProfileScript::Check(check)) => Ok(check.snapshot().clone()),
            _ => Err(scripted_failure(username)),
        }
    }

    async fn following(
        &self,
        username: &str,
        _user_id: Option<&str>,
    ) -> Result<Vec<String>, UpstreamError> {
        self.following_calls.fetch_add(1, Ordering::SeqCst);
        match self.following.lock().unwrap().get(username) {
            Some(Some(list)) => Ok(list.clone()),
            Some(None) => Err(UpstreamError::UnexpectedStatus {
                status: 500,
                url: format!("https://stub/following?username={username}"),
            }),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    List {
        username: String,
        added: Vec<String>,
        target: String,
    },
    Count {
        username: String,
        old: u64,
        new: u64,
        target: String,
    },
}

/// Records every notification attempt; fails after recording when told to.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub(crate) fn failing() -> Self {
        let notifier = Self::default();
        notifier.failing.store(true, Ordering::SeqCst);
        notifier
    }

    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn outcome(&self) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(NotifyError::Transport("scripted delivery failure".to_owned()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NotificationGateway for RecordingNotifier {
    async fn notify_list_change(
        &self,
        username: &str,
        new_usernames: &[String],
        target: &str,
    ) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(Sent::List {
            username: username.to_owned(),
            added: new_usernames.to_vec(),
            target: target.to_owned(),
        });
        self.outcome()
    }

    async fn notify_count_change(
        &self,
        username: &str,
        old_count: u64,
        new_count: u64,
        target: &str,
    ) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(Sent::Count {
            username: username.to_owned(),
            old: old_count,
            new: new_count,
            target: target.to_owned(),
        });
        self.outcome()
    }
}

/// In-memory stand-in for a lock shared between processes.
#[derive(Default)]
pub(crate) struct FlagLock {
    pub(crate) held: Arc<AtomicBool>,
    pub(crate) acquired: AtomicUsize,
}

struct FlagLease(Arc<AtomicBool>);

#[async_trait]
impl PassLock for FlagLock {
    async fn try_acquire(&self) -> Result<Option<Box<dyn PassLease>>, StoreError> {
        if self.held.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Box::new(FlagLease(Arc::clone(&self.held)))))
    }
}

#[async_trait]
impl PassLease for FlagLease {
    async fn release(self: Box<Self>) {
        self.0.store(false, Ordering::SeqCst);
    }
}
