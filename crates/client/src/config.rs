//! Client configuration.

use std::time::Duration;

use herald_core::preferences::DeliveryMode;

/// Delivery Controller configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the notification API, including `/api/v1`.
    pub api_url: String,
    /// WebSocket push endpoint.
    pub ws_url: String,
    /// Bearer token for both the API and the push channel.
    pub token: String,
    /// Username the token was issued to.
    pub username: String,
    pub poll: PollConfig,
}

/// Poll timer settings, one interval per delivery mode.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Interval while the user receives events immediately (default 30 s).
    pub immediate_interval: Duration,
    /// Interval while the user receives a daily digest (default 300 s).
    pub digest_interval: Duration,
    /// Page size for the initial and reconciliation fetches.
    pub page_size: i64,
}

impl PollConfig {
    /// Poll interval for the user's current delivery mode.
    pub fn interval_for(&self, mode: DeliveryMode) -> Duration {
        match mode {
            DeliveryMode::Immediate => self.immediate_interval,
            DeliveryMode::Digest => self.digest_interval,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            immediate_interval: Duration::from_secs(30),
            digest_interval: Duration::from_secs(300),
            page_size: 50,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                         |
    /// |---------------------------|---------------------------------|
    /// | `HERALD_API_URL`          | `http://localhost:3000/api/v1`  |
    /// | `HERALD_WS_URL`           | `ws://localhost:3000/api/v1/ws` |
    /// | `HERALD_TOKEN`            | (required)                      |
    /// | `HERALD_USERNAME`         | (required)                      |
    /// | `HERALD_POLL_SECS`        | `30`                            |
    /// | `HERALD_DIGEST_POLL_SECS` | `300`                           |
    /// | `HERALD_PAGE_SIZE`        | `50`                            |
    pub fn from_env() -> Self {
        let api_url = std::env::var("HERALD_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api/v1".into())
            .trim_end_matches('/')
            .to_string();
        let ws_url = std::env::var("HERALD_WS_URL")
            .unwrap_or_else(|_| "ws://localhost:3000/api/v1/ws".into());
        let token = std::env::var("HERALD_TOKEN").expect("HERALD_TOKEN must be set");
        let username = std::env::var("HERALD_USERNAME").expect("HERALD_USERNAME must be set");

        let immediate_secs: u64 = std::env::var("HERALD_POLL_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("HERALD_POLL_SECS must be a valid u64");
        let digest_secs: u64 = std::env::var("HERALD_DIGEST_POLL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("HERALD_DIGEST_POLL_SECS must be a valid u64");
        let page_size: i64 = std::env::var("HERALD_PAGE_SIZE")
            .unwrap_or_else(|_| "50".into())
            .parse()
            .expect("HERALD_PAGE_SIZE must be a valid i64");

        Self {
            api_url,
            ws_url,
            token,
            username,
            poll: PollConfig {
                immediate_interval: Duration::from_secs(immediate_secs),
                digest_interval: Duration::from_secs(digest_secs),
                page_size,
            },
        }
    }
}
