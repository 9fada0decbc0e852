//! Shared domain types, configuration, and collaborator interfaces for the
//! follow-tracking workspace.

pub mod accounts;
mod app_config;
pub mod clock;
pub mod config;
pub mod notify;
pub mod store;

use thiserror::Error;

pub use accounts::{
    clean_username, is_valid_username, NewTrackedAccount, ProfileSnapshot, TrackedAccount,
};
pub use app_config::{AppConfig, Environment};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_app_config, load_app_config_from_env};
pub use notify::{NotificationGateway, NotifyError};
pub use store::{AccountStore, PassLease, PassLock, StoreError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
