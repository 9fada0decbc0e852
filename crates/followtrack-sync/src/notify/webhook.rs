use std::time::Duration;

use async_trait::async_trait;
use followtrack_core::{NotificationGateway, NotifyError};
use reqwest::Client;
use serde::Serialize;

/// Body posted to the webhook for every detected change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChangeEvent<'a> {
    ListChange {
        username: &'a str,
        new_usernames: &'a [String],
        target: &'a str,
    },
    CountChange {
        username: &'a str,
        old_count: u64,
        new_count: u64,
        target: &'a str,
    },
}

/// Gateway that POSTs a [`ChangeEvent`] as JSON to a fixed URL.
///
/// Any 2xx status counts as delivered. Nothing is retried: the engine makes a
/// single attempt per change.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Webhook URLs usually embed a token.
        f.debug_struct("WebhookNotifier")
            .field("url", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl WebhookNotifier {
    /// # Errors
    ///
    /// Returns [`NotifyError::Transport`] if the HTTP client cannot be built.
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("followtrack/0.1")
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_owned(),
        })
    }

    async fn post(&self, event: &ChangeEvent<'_>) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "notify: webhook rejected event");
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for WebhookNotifier {
    async fn notify_list_change(
        &self,
        username: &str,
        new_usernames: &[String],
        target: &str,
    ) -> Result<(), NotifyError> {
        self.post(&ChangeEvent::ListChange {
            username,
            new_usernames,
            target,
        })
        .await
    }

    async fn notify_count_change(
        &self,
        username: &str,
        old_count: u64,
        new_count: u64,
        target: &str,
    ) -> Result<(), NotifyError> {
        self.post(&ChangeEvent::CountChange {
            username,
            old_count,
            new_count,
            target,
        })
        .await
    }
}
