use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub rapidapi_key: String,
    pub rapidapi_host: String,
    pub api_base_url: String,
    pub sync_enabled: bool,
    pub sync_cron: String,
    pub inter_account_delay_ms: u64,
    pub profile_cache_ttl_secs: u64,
    pub upstream_timeout_secs: u64,
    pub upstream_max_retries: u32,
    pub upstream_backoff_base_secs: u64,
    pub max_pages: usize,
    pub max_tracked_following: u64,
    pub max_trackers_per_owner: usize,
    pub notify_webhook_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn inter_account_delay(&self) -> Duration {
        Duration::from_millis(self.inter_account_delay_ms)
    }

    #[must_use]
    pub fn profile_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_cache_ttl_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("rapidapi_key", &"[redacted]")
            .field("rapidapi_host", &self.rapidapi_host)
            .field("api_base_url", &self.api_base_url)
            .field("sync_enabled", &self.sync_enabled)
            .field("sync_cron", &self.sync_cron)
            .field("inter_account_delay_ms", &self.inter_account_delay_ms)
            .field("profile_cache_ttl_secs", &self.profile_cache_ttl_secs)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("upstream_max_retries", &self.upstream_max_retries)
            .field(
                "upstream_backoff_base_secs",
                &self.upstream_backoff_base_secs,
            )
            .field("max_pages", &self.max_pages)
            .field("max_tracked_following", &self.max_tracked_following)
            .field("max_trackers_per_owner", &self.max_trackers_per_owner)
            .field(
                "notify_webhook_url",
                &self.notify_webhook_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
