//! HTTP client for the RapidAPI-hosted Instagram endpoints.
//!
//! Every request carries the RapidAPI key and host headers. Responses are
//! checked for HTTP status first and then for error bodies that arrive with a
//! 2xx status, which the upstream does routinely.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::api::SocialApi;
use crate::error::UpstreamError;
use crate::normalize::{error_message, normalize_user_id};
use crate::pagination::Page;
use crate::rate_limit::retry_with_backoff;

const DEFAULT_API_HOST: &str = "instagram-best-experience.p.rapidapi.com";
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Client for the upstream profile API.
///
/// Use [`RapidApiClient::new`] for production or
/// [`RapidApiClient::with_base_url`] to point at a mock server in tests.
pub struct RapidApiClient {
    client: Client,
    api_key: String,
    api_host: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl std::fmt::Debug for RapidApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RapidApiClient")
            .field("api_key", &"[redacted]")
            .field("api_host", &self.api_host)
            .field("base_url", &self.base_url.as_str())
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl RapidApiClient {
    /// Creates a client pointed at `https://{api_host}/`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`UpstreamError::InvalidBaseUrl`] if `api_host` does not form
    /// a valid URL.
    pub fn new(
        api_key: &str,
        api_host: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, UpstreamError> {
        let host = if api_host.trim().is_empty() {
            DEFAULT_API_HOST
        } else {
            api_host.trim()
        };
        Self::with_base_url(
            api_key,
            host,
            &format!("https://{host}"),
            timeout_secs,
            max_retries,
            backoff_base_secs,
        )
    }

    /// Creates a client with an explicit base URL. The host header is still
    /// sent as `api_host`.
    ///
    /// # Errors
    ///
    /// Same as [`RapidApiClient::new`].
    pub fn with_base_url(
        api_key: &str,
        api_host: &str,
        base_url: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("followtrack/0.1")
            .build()?;

        // Exactly one trailing slash; `build_url` pops the empty segment
        // before pushing the endpoint.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| UpstreamError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            api_host: api_host.to_owned(),
            base_url,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Builds `{base}/{endpoint}?{params}`, skipping params whose value is `None`.
    fn build_url(&self, endpoint: &str, params: &[(&str, Option<&str>)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(endpoint);
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                if let Some(value) = value {
                    pairs.append_pair(key, value);
                }
            }
        }
        // Drop the bare `?` left behind when every param was skipped.
        if url.query() == Some("") {
            url.set_query(None);
        }
        url
    }

    /// GETs `url` with retries, mapping status codes and error bodies to
    /// [`UpstreamError`] variants.
    async fn get_json(&self, endpoint: &str, url: &Url) -> Result<Value, UpstreamError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url.clone())
                    .header("x-rapidapi-key", &self.api_key)
                    .header("x-rapidapi-host", &self.api_host)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok())
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    return Err(UpstreamError::RateLimited {
                        endpoint: endpoint.to_owned(),
                        retry_after_secs,
                    });
                }

                if !status.is_success() {
                    return Err(UpstreamError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                let text = response.text().await?;
                let body: Value =
                    serde_json::from_str(&text).map_err(|e| UpstreamError::Deserialize {
                        context: format!("{endpoint} response"),
                        source: e,
                    })?;

                if let Some(message) = error_message(&body) {
                    return Err(UpstreamError::Api {
                        endpoint: endpoint.to_owned(),
                        message,
                    });
                }
                Ok(body)
            }
        })
        .await
    }

    async fn page(
        &self,
        endpoint: &str,
        user_id: &str,
        cursor_param: &str,
        cursor: Option<&str>,
    ) -> Result<Page, UpstreamError> {
        let url = self.build_url(endpoint, &[("user_id", Some(user_id)), (cursor_param, cursor)]);
        let body = self.get_json(endpoint, &url).await?;
        Ok(Page::from_body(body))
    }
}

#[async_trait]
impl SocialApi for RapidApiClient {
    async fn profile(&self, username: &str) -> Result<Value, UpstreamError> {
        let url = self.build_url("profile", &[("username", Some(username))]);
        self.get_json("profile", &url).await
    }

    async fn user_id(&self, username: &str) -> Result<String, UpstreamError> {
        let url = self.build_url("user_id_by_username", &[("username", Some(username))]);
        let body = self.get_json("user_id_by_username", &url).await?;
        normalize_user_id(&body).ok_or_else(|| UpstreamError::MissingUserId {
            username: username.to_owned(),
        })
    }

    async fn following_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page, UpstreamError> {
        self.page("following", user_id, "max_id", cursor).await
    }

    async fn followers_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page, UpstreamError> {
        self.page("user_followers", user_id, "max_id", cursor).await
    }

    async fn media_page(&self, user_id: &str, cursor: Option<&str>) -> Result<Page, UpstreamError> {
        self.page("feed", user_id, "next_max_id", cursor).await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
