//! Notification domain model.
//!
//! A [`Notification`] is the unit of delivery. Whether a notification
//! describes a single event or a digest of many is decided exactly once,
//! when the stored row is decoded via [`NotificationKind::from_stored`], and
//! carried as a tagged [`NotificationKind`] from then on. Nothing downstream
//! inspects titles or message text to tell the two apart.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::checkpoint::fallback_window;
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed title carried by every digest notification.
pub const DIGEST_TITLE: &str = "Daily Notification Summary";

/// Literal prefix every digest message starts with.
pub const DIGEST_MESSAGE_PREFIX: &str = "Summary:";

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Event category of an ordinary notification.
///
/// Serialized with the names used by the `notifications.category` column and
/// the client wire format (`dm`, `jobFair`, `community`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "dm")]
    Dm,
    #[serde(rename = "jobFair")]
    JobFair,
    #[serde(rename = "community")]
    Community,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Dm, Category::JobFair, Category::Community];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Dm => "dm",
            Category::JobFair => "jobFair",
            Category::Community => "community",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown notification category: {s}")))
    }
}

impl TryFrom<String> for Category {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// NotificationKind
// ---------------------------------------------------------------------------

/// What a notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum NotificationKind {
    /// A single event, optionally tied to the entity it concerns
    /// (chat id, job fair id, question id).
    Ordinary {
        category: Category,
        related_id: Option<DbId>,
    },
    /// A synthetic summary of everything that happened in a time window.
    Digest {
        window_start: Timestamp,
        window_end: Timestamp,
    },
}

/// Returns `true` when a title/message pair has the shape of a digest.
///
/// Only used to classify legacy rows stored before digest windows were
/// recorded. Both conditions must hold.
pub fn is_digest_content(title: &str, message: &str) -> bool {
    title == DIGEST_TITLE && message.starts_with(DIGEST_MESSAGE_PREFIX)
}

impl NotificationKind {
    /// Decode the kind of a stored notification row.
    ///
    /// A row that carries a digest window is a digest. A row without one is a
    /// digest only when its content matches [`is_digest_content`]; its window
    /// is then taken as the fallback window ending at `created_at`.
    pub fn from_stored(
        category: Category,
        related_id: Option<DbId>,
        title: &str,
        message: &str,
        window: Option<(Timestamp, Timestamp)>,
        created_at: Timestamp,
    ) -> Self {
        if let Some((window_start, window_end)) = window {
            return NotificationKind::Digest {
                window_start,
                window_end,
            };
        }
        if is_digest_content(title, message) {
            return NotificationKind::Digest {
                window_start: created_at - fallback_window(),
                window_end: created_at,
            };
        }
        NotificationKind::Ordinary {
            category,
            related_id,
        }
    }

    /// Category written to storage. Digests are stored under `dm`.
    pub fn storage_category(&self) -> Category {
        match self {
            NotificationKind::Ordinary { category, .. } => *category,
            NotificationKind::Digest { .. } => Category::Dm,
        }
    }

    /// Related entity id, if any. Digests never have one.
    pub fn related_id(&self) -> Option<DbId> {
        match self {
            NotificationKind::Ordinary { related_id, .. } => *related_id,
            NotificationKind::Digest { .. } => None,
        }
    }

    /// Digest window as `(start, end)`, or `None` for ordinary notifications.
    pub fn window(&self) -> Option<(Timestamp, Timestamp)> {
        match self {
            NotificationKind::Digest {
                window_start,
                window_end,
            } => Some((*window_start, *window_end)),
            NotificationKind::Ordinary { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A persisted notification addressed to one recipient.
///
/// Immutable except for `read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: DbId,
    /// Recipient username.
    pub recipient: String,
    #[serde(flatten)]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn is_digest(&self) -> bool {
        matches!(self.kind, NotificationKind::Digest { .. })
    }

    /// Ordinary category, or `None` for digests.
    pub fn category(&self) -> Option<Category> {
        match self.kind {
            NotificationKind::Ordinary { category, .. } => Some(category),
            NotificationKind::Digest { .. } => None,
        }
    }

    pub fn related_id(&self) -> Option<DbId> {
        self.kind.related_id()
    }
}

// ---------------------------------------------------------------------------
// NewNotification
// ---------------------------------------------------------------------------

/// A notification that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl NewNotification {
    /// Build an ordinary single-event notification with no related entity.
    pub fn ordinary(
        recipient: impl Into<String>,
        category: Category,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            kind: NotificationKind::Ordinary {
                category,
                related_id: None,
            },
            title: title.into(),
            message: message.into(),
        }
    }

    /// Attach the related entity id. Has no effect on digests.
    pub fn with_related(mut self, id: DbId) -> Self {
        if let NotificationKind::Ordinary { related_id, .. } = &mut self.kind {
            *related_id = Some(id);
        }
        self
    }

    /// Build a digest covering `(window_start, window_end]`.
    ///
    /// `message` is expected to come from
    /// [`compose_summary`](crate::summary::compose_summary) and therefore
    /// already start with [`DIGEST_MESSAGE_PREFIX`].
    pub fn digest(
        recipient: impl Into<String>,
        message: impl Into<String>,
        window_start: Timestamp,
        window_end: Timestamp,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            kind: NotificationKind::Digest {
                window_start,
                window_end,
            },
            title: DIGEST_TITLE.to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn at(h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 10, h, 0, 0).unwrap()
    }

    #[test]
    fn category_round_trips_through_str() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert!("email".parse::<Category>().is_err());
    }

    #[test]
    fn stored_row_with_window_is_digest() {
        let kind = NotificationKind::from_stored(
            Category::Dm,
            None,
            "anything",
            "anything",
            Some((at(1), at(9))),
            at(9),
        );
        assert_eq!(kind.window(), Some((at(1), at(9))));
    }

    #[test]
    fn legacy_digest_requires_title_and_prefix() {
        let legacy = NotificationKind::from_stored(
            Category::Dm,
            None,
            DIGEST_TITLE,
            "Summary: 2 new DM messages",
            None,
            at(9),
        );
        assert_eq!(legacy.window(), Some((at(9) - Duration::hours(24), at(9))));

        let wrong_prefix = NotificationKind::from_stored(
            Category::Dm,
            Some(4),
            DIGEST_TITLE,
            "You have 2 new DM messages",
            None,
            at(9),
        );
        assert_eq!(wrong_prefix.related_id(), Some(4));
        assert!(wrong_prefix.window().is_none());

        let wrong_title = NotificationKind::from_stored(
            Category::Dm,
            None,
            "New message",
            "Summary: hi",
            None,
            at(9),
        );
        assert!(wrong_title.window().is_none());
    }

    #[test]
    fn digest_is_stored_under_dm() {
        let digest = NewNotification::digest("bob", "Summary: x", at(1), at(2));
        assert_eq!(digest.kind.storage_category(), Category::Dm);
        assert_eq!(digest.title, DIGEST_TITLE);
    }

    #[test]
    fn with_related_ignores_digests() {
        let digest = NewNotification::digest("bob", "Summary: x", at(1), at(2)).with_related(9);
        assert_eq!(digest.kind.related_id(), None);

        let dm = NewNotification::ordinary("bob", Category::Dm, "New message", "hi").with_related(9);
        assert_eq!(dm.kind.related_id(), Some(9));
    }

    #[test]
    fn wire_format_is_flat_with_kind_tag() {
        let n = Notification {
            id: 7,
            recipient: "bob".into(),
            kind: NotificationKind::Ordinary {
                category: Category::JobFair,
                related_id: Some(3),
            },
            title: "Job fair started".into(),
            message: "Spring fair is live".into(),
            read: false,
            created_at: at(8),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["kind"], "ordinary");
        assert_eq!(json["category"], "jobFair");
        assert_eq!(json["relatedId"], 3);
        assert_eq!(json["createdAt"], "2026-03-10T08:00:00Z");

        let back: Notification = serde_json::from_value(json).unwrap();
        assert_eq!(back, n);
    }

    #[test]
    fn wire_format_accepts_missing_related_id() {
        let json = serde_json::json!({
            "id": 1,
            "recipient": "bob",
            "kind": "ordinary",
            "category": "community",
            "title": "t",
            "message": "m",
            "read": true,
            "createdAt": "2026-03-10T08:00:00Z",
        });
        let n: Notification = serde_json::from_value(json).unwrap();
        assert_eq!(n.related_id(), None);
        assert_eq!(n.category(), Some(Category::Community));
    }
}
