//! `sync`: one pass over every active tracker, outside the server's schedule.

use std::sync::Arc;

use followtrack_core::{AccountStore, AppConfig, NotificationGateway, SystemClock};
use followtrack_db::{MemoryAccountStore, PgAccountStore, PgPassLock};
use followtrack_sync::{BatchReport, LogNotifier, SyncEngine, SyncError, WebhookNotifier};
use sqlx::PgPool;

use crate::inspect::build_source;

/// Runs a single pass and prints its report.
///
/// A real pass takes the same Postgres advisory lock as the server's
/// scheduled passes, so the two never run at once. With `dry_run` the pass
/// works on an in-memory copy of the active trackers and notifications only
/// go to the log, so nothing in the database changes and no lock is taken.
///
/// # Errors
///
/// Returns an error if the upstream client or webhook notifier cannot be
/// built, the active trackers cannot be read, or another process is in the
/// middle of a pass.
pub(crate) async fn run_sync(pool: &PgPool, config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let pg = PgAccountStore::new(pool.clone());

    let store: Arc<dyn AccountStore>;
    let notifier: Arc<dyn NotificationGateway>;
    let mut pass_lock = None;
    if dry_run {
        let accounts = pg.list_active().await?;
        println!("dry-run: syncing {} tracker(s) in memory", accounts.len());
        store = Arc::new(MemoryAccountStore::with_accounts(accounts));
        notifier = Arc::new(LogNotifier);
    } else {
        store = Arc::new(pg);
        pass_lock = Some(Arc::new(PgPassLock::new(pool.clone())));
        notifier = match &config.notify_webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url, config.upstream_timeout_secs)?),
            None => Arc::new(LogNotifier),
        };
    }

    let mut engine = SyncEngine::new(
        Arc::new(build_source(config)?),
        store,
        notifier,
        Arc::new(SystemClock),
    )
    .with_inter_account_delay(config.inter_account_delay());
    if let Some(lock) = pass_lock {
        engine = engine.with_pass_lock(lock);
    }

    tracing::info!(dry_run, "sync: cli pass starting");
    let report = match engine.run_batch().await {
        Ok(report) => report,
        Err(SyncError::AlreadyRunning) => {
            anyhow::bail!("another sync pass is running, try again once it finishes");
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(?report, "sync: cli pass finished");
    print_report(&report);
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!("processed:        {}", report.total());
    println!("  unchanged:      {}", report.unchanged);
    println!("  list changed:   {}", report.list_changed);
    println!("  count changed:  {}", report.count_changed);
    println!("  fallback skips: {}", report.fallback_skipped);
    println!("  deactivated:    {}", report.deactivated);
    println!("  untracked:      {}", report.untracked);
    println!("  failed:         {}", report.failed);
}
