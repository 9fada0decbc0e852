//! The upstream surface the rest of the workspace depends on.
//!
//! [`crate::RapidApiClient`] is the production implementation. Tests swap in
//! in-memory stubs so nothing above this layer needs a network.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::pagination::Page;

/// Raw endpoint access. Implementations handle transport, status mapping,
/// retries, and error-body detection; they do not normalize shapes.
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// Raw `/profile` body for `username`.
    async fn profile(&self, username: &str) -> Result<Value, UpstreamError>;

    /// Resolves the numeric id list endpoints are keyed by.
    async fn user_id(&self, username: &str) -> Result<String, UpstreamError>;

    async fn following_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page, UpstreamError>;

    async fn followers_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page, UpstreamError>;

    async fn media_page(&self, user_id: &str, cursor: Option<&str>) -> Result<Page, UpstreamError>;
}
