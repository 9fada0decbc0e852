mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use followtrack_core::{AppConfig, NotificationGateway, SystemClock};
use followtrack_db::{PgAccountStore, PgPassLock};
use followtrack_sync::{run_schedule, ChannelTicker, LogNotifier, SyncEngine, UpstreamSource, WebhookNotifier};
use followtrack_upstream::{ListingOptions, ProfileCache, ProfileFetcher, RapidApiClient};
use sqlx::PgPool;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

/// Ticks buffered while a pass is still running. Extra ticks are dropped.
const TICK_BUFFER: usize = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(followtrack_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = followtrack_db::PoolConfig::from_app_config(&config);
    let pool = followtrack_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = followtrack_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations complete");

    let engine = Arc::new(build_engine(&config, pool.clone())?);

    let (stop_tx, stop_rx) = watch::channel(false);
    let (tick_tx, ticker) = ChannelTicker::new(TICK_BUFFER);
    let schedule = tokio::spawn(run_schedule(Arc::clone(&engine), ticker, stop_rx));

    let _scheduler = if config.sync_enabled {
        tracing::info!(cron = %config.sync_cron, "sync job enabled");
        Some(scheduler::build_scheduler(tick_tx, &config.sync_cron).await?)
    } else {
        tracing::warn!("FOLLOWTRACK_SYNC_ENABLED=false; no sync job registered");
        drop(tick_tx);
        None
    };

    let app = build_app(AppState {
        engine,
        pool,
        env: config.env,
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The loop finishes any pass in flight before observing the stop flag.
    let _ = stop_tx.send(true);
    match schedule.await {
        Ok(passes) => tracing::info!(passes, "schedule loop stopped"),
        Err(e) => tracing::error!(error = %e, "schedule loop panicked"),
    }
    Ok(())
}

fn build_engine(config: &AppConfig, pool: PgPool) -> anyhow::Result<SyncEngine> {
    let clock = Arc::new(SystemClock);

    let client = RapidApiClient::with_base_url(
        &config.rapidapi_key,
        &config.rapidapi_host,
        &config.api_base_url,
        config.upstream_timeout_secs,
        config.upstream_max_retries,
        config.upstream_backoff_base_secs,
    )?;
    let cache = Arc::new(ProfileCache::new(config.profile_cache_ttl(), clock.clone()));
    let fetcher = ProfileFetcher::new(Arc::new(client), cache)
        .with_following_limit(config.max_tracked_following);
    let source = UpstreamSource::new(
        fetcher,
        ListingOptions {
            max_pages: config.max_pages,
            inter_page_delay: Duration::ZERO,
        },
    );

    let notifier: Arc<dyn NotificationGateway> = match &config.notify_webhook_url {
        Some(url) => {
            tracing::info!("notifications: webhook");
            Arc::new(WebhookNotifier::new(url, config.upstream_timeout_secs)?)
        }
        None => {
            tracing::info!("notifications: log only");
            Arc::new(LogNotifier)
        }
    };

    Ok(SyncEngine::new(
        Arc::new(source),
        Arc::new(PgAccountStore::new(pool.clone())),
        notifier,
        clock,
    )
    .with_inter_account_delay(config.inter_account_delay())
    .with_pass_lock(Arc::new(PgPassLock::new(pool))))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
