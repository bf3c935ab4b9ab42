//! Notification entity models and DTOs.

use herald_core::error::CoreError;
use herald_core::notification::{
    is_digest_content, Category, NewNotification, Notification, NotificationKind,
};
use herald_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `notifications` table.
///
/// Decoded into a [`Notification`] via [`NotificationRow::into_notification`],
/// which is the single place the digest/ordinary distinction is made.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: DbId,
    pub recipient: String,
    #[sqlx(try_from = "String")]
    pub category: Category,
    pub title: String,
    pub message: String,
    pub related_id: Option<DbId>,
    pub window_start: Option<Timestamp>,
    pub window_end: Option<Timestamp>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl NotificationRow {
    pub fn into_notification(self) -> Notification {
        let window = self.window_start.zip(self.window_end);
        let kind = NotificationKind::from_stored(
            self.category,
            self.related_id,
            &self.title,
            &self.message,
            window,
            self.created_at,
        );
        Notification {
            id: self.id,
            recipient: self.recipient,
            kind,
            title: self.title,
            message: self.message,
            read: self.is_read,
            created_at: self.created_at,
        }
    }
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        row.into_notification()
    }
}

/// Unread totals for the notification badge.
///
/// Digests are never part of `unread`; they are reported separately so the
/// client can show a summary indicator instead of a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCounts {
    pub unread: i64,
    pub unread_summaries: i64,
}

/// Predicate for [`NotificationRepo::count_since`](crate::repositories::NotificationRepo::count_since).
#[derive(Debug, Clone, Copy)]
pub struct NotificationFilter<'a> {
    pub recipient: &'a str,
    pub category: Option<Category>,
    pub related_id: Option<DbId>,
}

impl<'a> NotificationFilter<'a> {
    pub fn for_recipient(recipient: &'a str) -> Self {
        Self {
            recipient,
            category: None,
            related_id: None,
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn related_to(mut self, related_id: DbId) -> Self {
        self.related_id = Some(related_id);
        self
    }
}

/// DTO for creating an ordinary notification on behalf of an event producer.
///
/// Digests cannot be created through this path; see [`CreateNotification::into_new`].
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotification {
    #[validate(length(min = 1, max = 150))]
    pub recipient: String,
    pub category: Category,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    pub related_id: Option<DbId>,
}

impl CreateNotification {
    /// Validate and convert into a [`NewNotification`].
    ///
    /// Content shaped like a digest is rejected, since such a row would be
    /// read back as one.
    pub fn into_new(self) -> Result<NewNotification, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        if is_digest_content(&self.title, &self.message) {
            return Err(CoreError::Validation(
                "Title and message are reserved for summary notifications".into(),
            ));
        }

        let new = NewNotification::ordinary(self.recipient, self.category, self.title, self.message);
        Ok(match self.related_id {
            Some(id) => new.with_related(id),
            None => new,
        })
    }
}
