use async_trait::async_trait;
use followtrack_core::{NotificationGateway, NotifyError};

/// Gateway that records changes in the log and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationGateway for LogNotifier {
    async fn notify_list_change(
        &self,
        username: &str,
        new_usernames: &[String],
        target: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            username = %username,
            target = %target,
            added = ?new_usernames,
            "notify: new follows"
        );
        Ok(())
    }

    async fn notify_count_change(
        &self,
        username: &str,
        old_count: u64,
        new_count: u64,
        target: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            username = %username,
            target = %target,
            old_count,
            new_count,
            "notify: following count changed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let notifier = LogNotifier;
        notifier
            .notify_list_change("alice", &["bob".to_owned()], "owner@example.com")
            .await
            .unwrap();
        notifier
            .notify_count_change("alice", 1, 2, "owner@example.com")
            .await
            .unwrap();
    }
}
