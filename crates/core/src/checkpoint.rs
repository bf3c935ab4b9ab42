//! Summary checkpoint policies.
//!
//! The checkpoint is the start of the window a digest run counts activity
//! in. It is derived, never stored: from the most recent prior digest, or,
//! for a user who has never received one, from a fallback window.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Length of the fallback window in hours.
pub const FALLBACK_WINDOW_HOURS: i64 = 24;

/// The fallback window as a [`Duration`].
pub fn fallback_window() -> Duration {
    Duration::hours(FALLBACK_WINDOW_HOURS)
}

/// How the start of a digest window is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckpointPolicy {
    /// Last digest's `created_at`, else 24 hours before now.
    LastDigestOr24h,
    /// As [`LastDigestOr24h`](Self::LastDigestOr24h), but a user with no
    /// prior digest whose last login is more than 24 hours old gets a window
    /// starting at that login, so days they skipped are not dropped.
    #[default]
    WidenToLastLogin,
}

impl CheckpointPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckpointPolicy::LastDigestOr24h => "last_digest",
            CheckpointPolicy::WidenToLastLogin => "widen_to_last_login",
        }
    }

    /// Compute the checkpoint for a run happening at `now`.
    pub fn compute(
        self,
        now: Timestamp,
        last_digest_at: Option<Timestamp>,
        last_login_at: Option<Timestamp>,
    ) -> Timestamp {
        if let Some(last_digest_at) = last_digest_at {
            return last_digest_at;
        }

        let fallback = now - fallback_window();
        match (self, last_login_at) {
            (CheckpointPolicy::WidenToLastLogin, Some(login)) if login < fallback => login,
            _ => fallback,
        }
    }
}

impl fmt::Display for CheckpointPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckpointPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last_digest" => Ok(CheckpointPolicy::LastDigestOr24h),
            "widen_to_last_login" => Ok(CheckpointPolicy::WidenToLastLogin),
            other => Err(CoreError::Validation(format!(
                "Unknown checkpoint policy: {other}"
            ))),
        }
    }
}
