//! User profile models and DTOs.

use herald_core::preferences::{NotificationPreferences, SummaryTime};
use herald_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProfile {
    pub id: DbId,
    pub username: String,
    pub display_name: Option<String>,
    pub last_login_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub notifications_enabled: bool,
    pub notifications_summarized: bool,
    pub summary_time: String,
    pub dm_notifications_enabled: bool,
    pub job_fair_notifications_enabled: bool,
    pub community_notifications_enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserProfile {
    pub fn preferences(&self) -> NotificationPreferences {
        NotificationPreferences {
            enabled: self.notifications_enabled,
            summarized: self.notifications_summarized,
            summary_time: self.summary_time.clone(),
            dm_enabled: self.dm_notifications_enabled,
            job_fair_enabled: self.job_fair_notifications_enabled,
            community_enabled: self.community_notifications_enabled,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A user opted into digests, as listed for the scheduler.
#[derive(Debug, Clone, FromRow)]
pub struct DigestSubscriber {
    pub username: String,
    /// Raw `HH:MM` value; may be malformed.
    pub summary_time: String,
}

/// DTO for creating a user profile.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub display_name: Option<String>,
}

/// DTO for updating notification preferences. Absent fields are unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferences {
    pub enabled: Option<bool>,
    pub summarized: Option<bool>,
    #[validate(custom(function = "validate_summary_time"))]
    pub summary_time: Option<String>,
    pub dm_enabled: Option<bool>,
    pub job_fair_enabled: Option<bool>,
    pub community_enabled: Option<bool>,
}

/// Reject anything that is not a strict `HH:MM` time of day.
fn validate_summary_time(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<SummaryTime>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("summary_time"))
}
