//! `track` and `untrack`: tracker registration from the command line.

use std::sync::Arc;

use followtrack_core::AppConfig;
use followtrack_db::PgAccountStore;
use followtrack_sync::{NewTracker, TrackerRegistry};
use sqlx::PgPool;
use uuid::Uuid;

use crate::inspect::build_source;

fn registry(pool: &PgPool, config: &AppConfig) -> anyhow::Result<TrackerRegistry> {
    Ok(TrackerRegistry::new(
        Arc::new(PgAccountStore::new(pool.clone())),
        Arc::new(build_source(config)?),
    )
    .with_max_per_owner(config.max_trackers_per_owner))
}

/// # Errors
///
/// Returns the registration error as-is: bad username, owner at the cap,
/// duplicate, a private/oversized profile, or a profile the upstream could
/// not serve right now.
pub(crate) async fn run_track(
    pool: &PgPool,
    config: &AppConfig,
    owner: Uuid,
    username: &str,
    notify: &str,
) -> anyhow::Result<()> {
    let created = registry(pool, config)?
        .register(NewTracker {
            owner_id: owner,
            username: username.to_owned(),
            notification_target: notify.to_owned(),
        })
        .await?;

    tracing::info!(
        id = created.id,
        %owner,
        username = %created.platform_username,
        "registry: tracked from cli"
    );
    println!(
        "tracking {} as #{} (following {})",
        created.platform_username, created.id, created.current_following_count
    );
    Ok(())
}

/// # Errors
///
/// Returns an error when no active tracker with `id` belongs to `owner`.
pub(crate) async fn run_untrack(
    pool: &PgPool,
    config: &AppConfig,
    owner: Uuid,
    id: i64,
) -> anyhow::Result<()> {
    registry(pool, config)?.deactivate(id, owner).await?;
    tracing::info!(id, %owner, "registry: untracked from cli");
    println!("tracker #{id} deactivated");
    Ok(())
}
