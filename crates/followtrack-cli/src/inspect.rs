//! Read-only upstream commands: `profile` and `following`.
//!
//! Both go through the same client, normalizer, and cache the sync engine
//! uses, so what they print is what a sync pass would see.

use std::sync::Arc;
use std::time::Duration;

use followtrack_core::{AppConfig, SystemClock};
use followtrack_sync::UpstreamSource;
use followtrack_upstream::{
    fetch_following, ListingOptions, ProfileCache, ProfileCheck, ProfileFetcher, RapidApiClient,
};

pub(crate) fn build_fetcher(config: &AppConfig) -> anyhow::Result<ProfileFetcher<RapidApiClient>> {
    let client = RapidApiClient::with_base_url(
        &config.rapidapi_key,
        &config.rapidapi_host,
        &config.api_base_url,
        config.upstream_timeout_secs,
        config.upstream_max_retries,
        config.upstream_backoff_base_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build upstream client: {e}"))?;
    let cache = Arc::new(ProfileCache::new(
        config.profile_cache_ttl(),
        Arc::new(SystemClock),
    ));

    Ok(ProfileFetcher::new(Arc::new(client), cache)
        .with_following_limit(config.max_tracked_following))
}

pub(crate) fn listing_options(config: &AppConfig, max_pages: Option<usize>) -> ListingOptions {
    ListingOptions {
        max_pages: max_pages.unwrap_or(config.max_pages),
        inter_page_delay: Duration::ZERO,
    }
}

pub(crate) fn build_source(config: &AppConfig) -> anyhow::Result<UpstreamSource<RapidApiClient>> {
    Ok(UpstreamSource::new(
        build_fetcher(config)?,
        listing_options(config, None),
    ))
}

fn classify(check: &ProfileCheck) -> String {
    match check {
        ProfileCheck::Usable(snapshot) if snapshot.is_fallback => {
            "unavailable (fallback snapshot)".to_owned()
        }
        ProfileCheck::Usable(_) => "trackable".to_owned(),
        ProfileCheck::Private(_) => "private".to_owned(),
        ProfileCheck::OverLimit { limit, .. } => format!("follows more than {limit} accounts"),
    }
}

/// Prints the normalized snapshot as JSON followed by its classification.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the snapshot cannot be
/// serialized. Upstream failures show up as a fallback snapshot instead.
pub(crate) async fn run_profile(config: &AppConfig, username: &str) -> anyhow::Result<()> {
    let fetcher = build_fetcher(config)?;
    let check = fetcher.validate_profile(username).await;

    println!("{}", serde_json::to_string_pretty(check.snapshot())?);
    println!("status: {}", classify(&check));
    Ok(())
}

/// Prints one following username per line, then a total.
///
/// # Errors
///
/// Returns an error if the id lookup or any page fails, or the page bound is
/// reached.
pub(crate) async fn run_following(
    config: &AppConfig,
    username: &str,
    max_pages: Option<usize>,
) -> anyhow::Result<()> {
    let fetcher = build_fetcher(config)?;
    let names = fetch_following(
        fetcher.api().as_ref(),
        username,
        listing_options(config, max_pages),
    )
    .await?;

    for name in &names {
        println!("{name}");
    }
    println!("total: {}", names.len());
    Ok(())
}
