//! Notification API client.
//!
//! [`NotificationApi`] is the Delivery Controller's view of the
//! notification store. [`HttpNotificationApi`] talks to the herald HTTP
//! API using [`reqwest`].

use async_trait::async_trait;
use herald_core::notification::Notification;
use herald_core::preferences::NotificationPreferences;
use herald_core::summary::SummaryBreakdown;
use herald_core::types::DbId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Errors from the client transports.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The push channel could not be opened or broke.
    #[error("Push channel error: {0}")]
    Push(String),
}

/// Unread totals as reported by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCounts {
    pub unread: i64,
    pub unread_summaries: i64,
}

/// Partial preference update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summarized: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dm_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_fair_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_enabled: Option<bool>,
}

/// Store operations used by the Delivery Controller. All calls act on
/// behalf of the authenticated user.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Notifications newest first.
    async fn list(
        &self,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, ClientError>;

    async fn unread_counts(&self) -> Result<UnreadCounts, ClientError>;

    async fn mark_read(&self, id: DbId) -> Result<(), ClientError>;

    async fn mark_all_read(&self) -> Result<u64, ClientError>;

    async fn clear_all(&self) -> Result<u64, ClientError>;

    async fn summary(&self, digest_id: DbId) -> Result<SummaryBreakdown, ClientError>;

    async fn preferences(&self) -> Result<NotificationPreferences, ClientError>;

    async fn update_preferences(
        &self,
        update: &PreferencesUpdate,
    ) -> Result<NotificationPreferences, ClientError>;
}

/// `{ "data": ... }` response envelope.
#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct AffectedResponse {
    affected: u64,
}

/// HTTP client for the herald notification API.
pub struct HttpNotificationApi {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl HttpNotificationApi {
    /// * `api_url` - base URL including the version prefix, e.g.
    ///   `http://host:3000/api/v1`.
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, token)
    }

    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/notifications{path}", self.api_url)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Unwrap the `data` envelope of a successful response.
    async fn parse_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<DataResponse<T>>().await?.data)
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn list(
        &self,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, ClientError> {
        let response = self
            .client
            .get(self.url(""))
            .bearer_auth(&self.token)
            .query(&[
                ("unread_only", unread_only.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await?;
        Self::parse_data(response).await
    }

    async fn unread_counts(&self) -> Result<UnreadCounts, ClientError> {
        let response = self
            .client
            .get(self.url("/unread-count"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::parse_data(response).await
    }

    async fn mark_read(&self, id: DbId) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url(&format!("/{id}/read")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<u64, ClientError> {
        let response = self
            .client
            .post(self.url("/read-all"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let affected: AffectedResponse = Self::parse_data(response).await?;
        Ok(affected.affected)
    }

    async fn clear_all(&self) -> Result<u64, ClientError> {
        let response = self
            .client
            .delete(self.url(""))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let affected: AffectedResponse = Self::parse_data(response).await?;
        Ok(affected.affected)
    }

    async fn summary(&self, digest_id: DbId) -> Result<SummaryBreakdown, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/{digest_id}/summary")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::parse_data(response).await
    }

    async fn preferences(&self) -> Result<NotificationPreferences, ClientError> {
        let response = self
            .client
            .get(self.url("/preferences"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::parse_data(response).await
    }

    async fn update_preferences(
        &self,
        update: &PreferencesUpdate,
    ) -> Result<NotificationPreferences, ClientError> {
        let response = self
            .client
            .put(self.url("/preferences"))
            .bearer_auth(&self.token)
            .json(update)
            .send()
            .await?;
        Self::parse_data(response).await
    }
}
