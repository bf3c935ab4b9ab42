//! Per-user delivery session.
//!
//! [`NotificationSession`] owns everything the Delivery Controller knows
//! about one signed-in user: preferences, the current view, the session's
//! suppression set, the local notification list and the pop-up on screen.
//! It does no I/O. Every mutating operation returns the ids the store
//! should be told about, and the controller performs those calls.

use std::collections::HashSet;
use std::time::Duration;

use herald_core::notification::{Category, Notification, NotificationKind};
use herald_core::preferences::{DeliveryMode, NotificationPreferences};
use herald_core::types::DbId;
use serde::Serialize;

use crate::view::{Route, ViewContext};

/// How long an ordinary pop-up stays up.
pub const POPUP_DURATION: Duration = Duration::from_secs(5);

/// How long a digest pop-up stays up.
pub const DIGEST_POPUP_DURATION: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// SuppressionSet
// ---------------------------------------------------------------------------

/// Ids of notifications hidden because they arrived about something the
/// user was looking at.
///
/// Insert-only: once suppressed, a notification stays hidden for the rest
/// of the session even after the user navigates away.
#[derive(Debug, Clone, Default)]
pub struct SuppressionSet {
    ids: HashSet<DbId>,
}

impl SuppressionSet {
    /// Returns `true` if the id was not suppressed before.
    pub fn insert(&mut self, id: DbId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: DbId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Pop-ups and snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Popup {
    pub notification: Notification,
    #[serde(skip)]
    pub duration: Duration,
}

/// What the UI renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxSnapshot {
    pub visible: Vec<Notification>,
    pub unread_count: usize,
    pub has_unread_summary: bool,
    pub popup: Option<Popup>,
}

/// Effects of [`NotificationSession::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Notifications that were not in the list before.
    pub added: usize,
    /// Ids to mark read in the store.
    pub acknowledge: Vec<DbId>,
    /// Pop-up raised by this merge, if any.
    pub popup: Option<Popup>,
}

// ---------------------------------------------------------------------------
// NotificationSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NotificationSession {
    username: String,
    preferences: NotificationPreferences,
    route: Route,
    view: ViewContext,
    suppressed: SuppressionSet,
    /// Newest first. Includes suppressed notifications.
    notifications: Vec<Notification>,
    unread_count: usize,
    has_unread_summary: bool,
    popup: Option<Popup>,
}

impl NotificationSession {
    pub fn new(username: impl Into<String>, preferences: NotificationPreferences) -> Self {
        Self {
            username: username.into(),
            preferences,
            route: Route::Other,
            view: ViewContext::default(),
            suppressed: SuppressionSet::default(),
            notifications: Vec::new(),
            unread_count: 0,
            has_unread_summary: false,
            popup: None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn preferences(&self) -> &NotificationPreferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: NotificationPreferences) {
        self.preferences = preferences;
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        self.preferences.delivery_mode()
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn view(&self) -> ViewContext {
        self.view
    }

    pub fn suppressed(&self) -> &SuppressionSet {
        &self.suppressed
    }

    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    pub fn has_unread_summary(&self) -> bool {
        self.has_unread_summary
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn contains(&self, id: DbId) -> bool {
        self.notifications.iter().any(|n| n.id == id)
    }

    /// Whether the notification is about what the user is viewing right now.
    fn matches_view(&self, notification: &Notification) -> bool {
        let NotificationKind::Ordinary {
            category,
            related_id: Some(related),
        } = notification.kind
        else {
            return false;
        };
        match category {
            Category::Dm => self.view.active_chat == Some(related),
            Category::JobFair => self.view.active_job_fair == Some(related),
            Category::Community => self.view.active_question == Some(related),
        }
    }

    /// Whether a notification may be shown, suppressing it first if it
    /// concerns the current view.
    ///
    /// Digests are never suppressed by the view. Returns `false` for
    /// anything in the suppression set.
    pub fn should_show(&mut self, notification: &Notification) -> bool {
        if self.suppressed.contains(notification.id) {
            return false;
        }
        if self.matches_view(notification) {
            self.suppressed.insert(notification.id);
            return false;
        }
        true
    }

    /// Notifications the user can see, newest first.
    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.notifications
            .iter()
            .filter(|n| !self.suppressed.contains(n.id))
    }

    /// Replace the list with a full fetch.
    ///
    /// Returns the ids of unread notifications that were suppressed and
    /// should be acknowledged in the store.
    pub fn load(&mut self, mut notifications: Vec<Notification>) -> Vec<DbId> {
        sort_newest_first(&mut notifications);
        notifications.dedup_by_key(|n| n.id);
        self.notifications = notifications;
        let acknowledge = self.refilter();
        self.recount();
        acknowledge
    }

    /// Merge notifications from the push channel or a poll.
    ///
    /// Ids already in the list are ignored, so the same notification
    /// arriving by push and by poll is only ever counted once.
    pub fn merge(&mut self, incoming: Vec<Notification>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        let mut newest_shown: Option<Notification> = None;

        for mut notification in incoming {
            if self.contains(notification.id) {
                continue;
            }
            outcome.added += 1;

            if self.should_show(&notification) {
                let newer = newest_shown
                    .as_ref()
                    .map_or(true, |n| newer_than(&notification, n));
                if !notification.read && newer {
                    newest_shown = Some(notification.clone());
                }
            } else if !notification.read {
                notification.read = true;
                outcome.acknowledge.push(notification.id);
            }
            self.notifications.push(notification);
        }

        if outcome.added > 0 {
            sort_newest_first(&mut self.notifications);
            self.recount();
        }

        if let Some(notification) = newest_shown {
            if let Some(duration) = self.popup_duration(&notification) {
                let popup = Popup {
                    notification,
                    duration,
                };
                self.popup = Some(popup.clone());
                outcome.popup = Some(popup);
            }
        }
        outcome
    }

    /// Pop-up duration for a newly shown notification, or `None` when the
    /// user's preferences do not allow one.
    fn popup_duration(&self, notification: &Notification) -> Option<Duration> {
        let prefs = &self.preferences;
        match notification.category() {
            None => prefs.enabled.then_some(DIGEST_POPUP_DURATION),
            Some(category) => (prefs.delivery_mode() == DeliveryMode::Immediate
                && prefs.popup_enabled(category))
            .then_some(POPUP_DURATION),
        }
    }

    /// Move to a new location.
    ///
    /// Re-applies the visibility rules to the whole list. Entering the
    /// notifications page acknowledges every unread digest. Returns the ids
    /// to mark read in the store.
    pub fn navigate(&mut self, route: Route) -> Vec<DbId> {
        self.route = route;
        self.view = ViewContext::from(route);
        let mut acknowledge = self.refilter();

        if self.view.on_notifications_page {
            for notification in &mut self.notifications {
                if notification.is_digest() && !notification.read {
                    notification.read = true;
                    acknowledge.push(notification.id);
                }
            }
        }

        self.recount();
        acknowledge
    }

    /// Returns `true` if the notification existed and was unread.
    pub fn mark_read_local(&mut self, id: DbId) -> bool {
        let changed = match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) if !n.read => {
                n.read = true;
                true
            }
            _ => false,
        };
        if changed {
            self.recount();
        }
        changed
    }

    /// Returns the number of notifications that changed.
    pub fn mark_all_read_local(&mut self) -> usize {
        let mut changed = 0;
        for n in self.notifications.iter_mut().filter(|n| !n.read) {
            n.read = true;
            changed += 1;
        }
        self.recount();
        changed
    }

    /// Drop every notification and the pop-up. The suppression set is kept.
    pub fn clear_local(&mut self) {
        self.notifications.clear();
        self.popup = None;
        self.recount();
    }

    /// Forget everything learned while running: the loaded list, the
    /// pop-up, the current view and the suppression set. Identity and
    /// preferences stay.
    pub fn reset(&mut self) {
        let preferences = std::mem::take(&mut self.preferences);
        *self = Self::new(std::mem::take(&mut self.username), preferences);
    }

    /// Returns `true` if the pop-up for `id` was on screen.
    pub fn dismiss_popup(&mut self, id: DbId) -> bool {
        if self.popup.as_ref().is_some_and(|p| p.notification.id == id) {
            self.popup = None;
            return true;
        }
        false
    }

    pub fn snapshot(&self) -> InboxSnapshot {
        InboxSnapshot {
            visible: self.visible().cloned().collect(),
            unread_count: self.unread_count,
            has_unread_summary: self.has_unread_summary,
            popup: self.popup.clone(),
        }
    }

    /// Apply [`should_show`](Self::should_show) to the whole list and mark
    /// newly hidden unread notifications read.
    fn refilter(&mut self) -> Vec<DbId> {
        let mut hidden = Vec::new();
        for index in 0..self.notifications.len() {
            let notification = &self.notifications[index];
            if self.suppressed.contains(notification.id) {
                continue;
            }
            if self.matches_view(notification) {
                let id = notification.id;
                self.suppressed.insert(id);
                hidden.push(index);
            }
        }

        let mut acknowledge = Vec::new();
        for index in hidden {
            let notification = &mut self.notifications[index];
            if !notification.read {
                notification.read = true;
                acknowledge.push(notification.id);
            }
        }
        if self
            .popup
            .as_ref()
            .is_some_and(|p| self.suppressed.contains(p.notification.id))
        {
            self.popup = None;
        }
        acknowledge
    }

    fn recount(&mut self) {
        let (unread, summary) = self
            .visible()
            .filter(|n| !n.read)
            .fold((0, false), |(count, summary), n| {
                if n.is_digest() {
                    (count, true)
                } else {
                    (count + 1, summary)
                }
            });
        self.unread_count = unread;
        self.has_unread_summary = summary;
    }
}

fn newer_than(a: &Notification, b: &Notification) -> bool {
    (a.created_at, a.id) > (b.created_at, b.id)
}

fn sort_newest_first(notifications: &mut [Notification]) {
    notifications.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
