//! Scripted in-memory [`SocialApi`] for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::SocialApi;
use crate::error::UpstreamError;
use crate::pagination::Page;

pub(crate) fn server_error() -> UpstreamError {
    UpstreamError::UnexpectedStatus {
        status: 502,
        url: "https://stub/profile".to_owned(),
    }
}

#[derive(Default)]
pub(crate) struct StubApi {
    profiles: Mutex<VecDeque<Result<Value, UpstreamError>>>,
    user_ids: HashMap<String, String>,
    following: Mutex<VecDeque<Value>>,
    pub(crate) profile_calls: AtomicUsize,
    pub(crate) cursors: Mutex<Vec<Option<String>>>,
}

impl StubApi {
    pub(crate) fn with_profiles(responses: Vec<Result<Value, UpstreamError>>) -> Self {
        Self {
            profiles: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub(crate) fn with_user_id(mut self, username: &str, id: &str) -> Self {
        self.user_ids.insert(username.to_owned(), id.to_owned());
        self
    }

    pub(crate) fn with_pages(self, pages: Vec<Value>) -> Self {
        *self.following.lock().unwrap() = pages.into();
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    fn next_page(&self, cursor: Option<&str>) -> Page {
        self.cursors.lock().unwrap().push(cursor.map(str::to_owned));
        let body = self.following.lock().unwrap().pop_front().unwrap_or(Value::Null);
        Page::from_body(body)
    }
}

#[async_trait]
impl SocialApi for StubApi {
    async fn profile(&self, _username: &str) -> Result<Value, UpstreamError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profiles
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(server_error()))
    }

    async fn user_id(&self, username: &str) -> Result<String, UpstreamError> {
        self.user_ids
            .get(username)
            .cloned()
            .ok_or_else(|| UpstreamError::MissingUserId {
                username: username.to_owned(),
            })
    }

    async fn following_page(
        &self,
        _user_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page, UpstreamError> {
        Ok(self.next_page(cursor))
    }

    async fn followers_page(
        &self,
        _user_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page, UpstreamError> {
        Ok(self.next_page(cursor))
    }

    async fn media_page(&self, _user_id: &str, cursor: Option<&str>) -> Result<Page, UpstreamError> {
        Ok(self.next_page(cursor))
    }
}
