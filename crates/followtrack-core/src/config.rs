use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_RAPIDAPI_HOST: &str = "instagram-best-experience.p.rapidapi.com";

/// Cron expression used in production: top of every hour.
const PRODUCTION_SYNC_CRON: &str = "0 0 * * * *";

/// Cron expression used everywhere else: every minute.
const DEVELOPMENT_SYNC_CRON: &str = "0 * * * * *";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let rapidapi_key = require("RAPIDAPI_KEY")?;

    let env = parse_environment(&or_default("FOLLOWTRACK_ENV", "development"));

    let bind_addr = or_default("FOLLOWTRACK_BIND_ADDR", "0.0.0.0:5000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("FOLLOWTRACK_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("FOLLOWTRACK_LOG_LEVEL", "info");

    let rapidapi_host = or_default("RAPIDAPI_HOST", DEFAULT_RAPIDAPI_HOST);
    let api_base_url = or_default(
        "FOLLOWTRACK_API_BASE_URL",
        &format!("https://{rapidapi_host}"),
    );

    let sync_enabled = parse_bool(&or_default("FOLLOWTRACK_SYNC_ENABLED", "true"))
        .ok_or_else(|| invalid("FOLLOWTRACK_SYNC_ENABLED", "expected true or false".into()))?;
    let default_cron = if env.is_production() {
        PRODUCTION_SYNC_CRON
    } else {
        DEVELOPMENT_SYNC_CRON
    };
    let sync_cron = or_default("FOLLOWTRACK_SYNC_CRON", default_cron);

    let inter_account_delay_ms = parse_u64("FOLLOWTRACK_INTER_ACCOUNT_DELAY_MS", "2000")?;
    let profile_cache_ttl_secs = parse_u64("FOLLOWTRACK_PROFILE_CACHE_TTL_SECS", "900")?;
    let upstream_timeout_secs = parse_u64("FOLLOWTRACK_UPSTREAM_TIMEOUT_SECS", "30")?;
    let upstream_max_retries = parse_u32("FOLLOWTRACK_UPSTREAM_MAX_RETRIES", "2")?;
    let upstream_backoff_base_secs = parse_u64("FOLLOWTRACK_UPSTREAM_BACKOFF_BASE_SECS", "2")?;
    let max_pages = parse_usize("FOLLOWTRACK_MAX_PAGES", "200")?;
    if max_pages == 0 {
        return Err(invalid("FOLLOWTRACK_MAX_PAGES", "must be at least 1".into()));
    }
    let max_tracked_following = parse_u64("FOLLOWTRACK_MAX_TRACKED_FOLLOWING", "7500")?;
    let max_trackers_per_owner = parse_usize("FOLLOWTRACK_MAX_TRACKERS_PER_OWNER", "3")?;
    let notify_webhook_url = lookup("FOLLOWTRACK_NOTIFY_WEBHOOK_URL")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let db_max_connections = parse_u32("FOLLOWTRACK_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("FOLLOWTRACK_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("FOLLOWTRACK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        rapidapi_key,
        rapidapi_host,
        api_base_url,
        sync_enabled,
        sync_cron,
        inter_account_delay_ms,
        profile_cache_ttl_secs,
        upstream_timeout_secs,
        upstream_max_retries,
        upstream_backoff_base_secs,
        max_pages,
        max_tracked_following,
        max_trackers_per_owner,
        notify_webhook_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
