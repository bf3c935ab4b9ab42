//! Per-user notification preferences.
//!
//! Preferences live on the user profile record. `summarized` selects between
//! two mutually exclusive delivery policies; the per-category toggles gate
//! pop-up visibility only and never affect what is stored.

use std::fmt;
use std::str::FromStr;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::notification::Category;
use crate::types::Timestamp;

/// Mutually exclusive delivery policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Per-event pop-ups.
    Immediate,
    /// One aggregated digest per day.
    Digest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    /// Master switch.
    pub enabled: bool,
    /// Digest mode when `true`, immediate mode otherwise.
    pub summarized: bool,
    /// Preferred daily digest anchor, `HH:MM` in UTC.
    pub summary_time: String,
    pub dm_enabled: bool,
    pub job_fair_enabled: bool,
    pub community_enabled: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            summarized: false,
            summary_time: SummaryTime::DEFAULT.to_string(),
            dm_enabled: true,
            job_fair_enabled: true,
            community_enabled: true,
        }
    }
}

impl NotificationPreferences {
    pub fn delivery_mode(&self) -> DeliveryMode {
        if self.summarized {
            DeliveryMode::Digest
        } else {
            DeliveryMode::Immediate
        }
    }

    /// Whether the summary aggregator may run for this user.
    pub fn digest_eligible(&self) -> bool {
        self.enabled && self.summarized
    }

    /// The per-category toggle, ignoring the master switch.
    pub fn category_enabled(&self, category: Category) -> bool {
        match category {
            Category::Dm => self.dm_enabled,
            Category::JobFair => self.job_fair_enabled,
            Category::Community => self.community_enabled,
        }
    }

    /// Whether a pop-up may be shown for an ordinary notification.
    pub fn popup_enabled(&self, category: Category) -> bool {
        self.enabled && self.category_enabled(category)
    }

    /// Parse `summary_time`.
    pub fn summary_time(&self) -> Result<SummaryTime, CoreError> {
        self.summary_time.parse()
    }
}

// ---------------------------------------------------------------------------
// SummaryTime
// ---------------------------------------------------------------------------

/// A wall-clock minute of the day (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SummaryTime {
    hour: u32,
    minute: u32,
}

impl SummaryTime {
    /// Anchor used when a user has none or it cannot be parsed.
    pub const DEFAULT: SummaryTime = SummaryTime { hour: 9, minute: 0 };

    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn hour(self) -> u32 {
        self.hour
    }

    pub fn minute(self) -> u32 {
        self.minute
    }

    /// Whether this anchor has been reached on the UTC day of `at`.
    pub fn reached_by(self, at: Timestamp) -> bool {
        (at.hour(), at.minute()) >= (self.hour, self.minute)
    }
}

impl fmt::Display for SummaryTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for SummaryTime {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::Validation(format!("Invalid summary time '{s}', expected HH:MM"));

        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(h) || !two_digits(m) {
            return Err(invalid());
        }

        let hour = h.parse().map_err(|_| invalid())?;
        let minute = m.parse().map_err(|_| invalid())?;
        SummaryTime::new(hour, minute).ok_or_else(invalid)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn defaults_are_immediate_and_enabled() {
        let prefs = NotificationPreferences::default();
        assert_eq!(prefs.delivery_mode(), DeliveryMode::Immediate);
        assert!(!prefs.digest_eligible());
        assert_eq!(prefs.summary_time().unwrap(), SummaryTime::DEFAULT);
    }

    #[test]
    fn digest_eligibility_needs_master_switch() {
        let mut prefs = NotificationPreferences {
            summarized: true,
            ..Default::default()
        };
        assert!(prefs.digest_eligible());
        prefs.enabled = false;
        assert!(!prefs.digest_eligible());
    }

    #[test]
    fn popup_respects_master_and_category() {
        let mut prefs = NotificationPreferences {
            job_fair_enabled: false,
            ..Default::default()
        };
        assert!(prefs.popup_enabled(Category::Dm));
        assert!(!prefs.popup_enabled(Category::JobFair));
        prefs.enabled = false;
        assert!(!prefs.popup_enabled(Category::Dm));
    }

    #[test]
    fn parses_valid_times() {
        assert_eq!("07:30".parse::<SummaryTime>().unwrap(), SummaryTime::new(7, 30).unwrap());
        assert_eq!("23:59".parse::<SummaryTime>().unwrap().to_string(), "23:59");
    }

    #[test]
    fn rejects_malformed_times() {
        for bad in ["", "9", "9:00", "24:00", "12:60", "ab:cd", "12-30", "12:3x", "+1:00"] {
            assert!(bad.parse::<SummaryTime>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn reached_from_the_anchor_minute_until_midnight() {
        let t = SummaryTime::new(18, 45).unwrap();
        let at = |h, m, s| Utc.with_ymd_and_hms(2026, 1, 2, h, m, s).unwrap();
        assert!(!t.reached_by(at(18, 44, 59)));
        assert!(t.reached_by(at(18, 45, 0)));
        assert!(t.reached_by(at(18, 46, 0)));
        assert!(t.reached_by(at(23, 59, 59)));
        assert!(!t.reached_by(at(0, 0, 0)));
    }
}
