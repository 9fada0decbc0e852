use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited on {endpoint} (retry after {retry_after_secs}s)")]
    RateLimited {
        endpoint: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The body parsed but carried an error status or message.
    #[error("upstream error from {endpoint}: {message}")]
    Api { endpoint: String, message: String },

    #[error("unrecognized {endpoint} response for {username}")]
    Unrecognized { endpoint: String, username: String },

    #[error("could not resolve a user id for {username}")]
    MissingUserId { username: String },

    #[error("pagination exhausted on {endpoint}: {reason}")]
    PaginationExhausted { endpoint: String, reason: String },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}
