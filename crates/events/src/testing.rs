//! In-memory [`SummaryStore`] for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use herald_core::job_fair::JobFairStatus;
use herald_core::notification::{Category, NewNotification, Notification};
use herald_core::preferences::NotificationPreferences;
use herald_core::types::{DbId, Timestamp};
use herald_db::models::chat::ChatPeer;
use herald_db::models::community::{Community, Question};
use herald_db::models::job_fair::JobFair;
use herald_db::models::user::UserProfile;

use crate::store::SummaryStore;

#[derive(Default)]
struct State {
    next_id: DbId,
    users: Vec<UserProfile>,
    notifications: Vec<Notification>,
    chats: Vec<(DbId, String, String)>,
    messages: Vec<(DbId, String, Timestamp)>,
    fairs: Vec<(JobFair, Vec<String>)>,
    communities: Vec<Community>,
    questions: Vec<Question>,
}

impl State {
    fn id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn add_user(
        &self,
        username: &str,
        prefs: NotificationPreferences,
        last_login_at: Option<Timestamp>,
    ) {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state.users.push(UserProfile {
            id,
            username: username.into(),
            display_name: None,
            last_login_at,
            deleted_at: None,
            notifications_enabled: prefs.enabled,
            notifications_summarized: prefs.summarized,
            summary_time: prefs.summary_time,
            dm_notifications_enabled: prefs.dm_enabled,
            job_fair_notifications_enabled: prefs.job_fair_enabled,
            community_notifications_enabled: prefs.community_enabled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    pub fn delete_user(&self, username: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.username == username) {
            user.deleted_at = Some(Utc::now());
        }
    }

    pub fn add_chat(&self, a: &str, b: &str) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state.chats.push((id, a.into(), b.into()));
        id
    }

    pub fn add_message(&self, chat_id: DbId, sender: &str, sent_at: Timestamp) {
        let mut state = self.state.lock().unwrap();
        state.messages.push((chat_id, sender.into(), sent_at));
    }

    pub fn add_fair(
        &self,
        name: &str,
        status: JobFairStatus,
        starts_at: Timestamp,
        ends_at: Timestamp,
        participants: &[&str],
    ) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        let fair = JobFair {
            id,
            name: name.into(),
            status,
            starts_at,
            ends_at,
            created_at: Utc::now(),
        };
        let participants = participants.iter().map(|p| p.to_string()).collect();
        state.fairs.push((fair, participants));
        id
    }

    pub fn add_community(&self, name: &str) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state.communities.push(Community {
            id,
            name: name.into(),
            created_at: Utc::now(),
        });
        id
    }

    pub fn add_question(&self, community_id: DbId, asked_by: &str, asked_at: Timestamp) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state.questions.push(Question {
            id,
            community_id,
            title: format!("Question {id}"),
            asked_by: asked_by.into(),
            asked_at,
        });
        id
    }

    pub fn add_notification(&self, new: &NewNotification, created_at: Timestamp) -> Notification {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        let notification = Notification {
            id,
            recipient: new.recipient.clone(),
            kind: new.kind.clone(),
            title: new.title.clone(),
            message: new.message.clone(),
            read: false,
            created_at,
        };
        state.notifications.push(notification.clone());
        notification
    }

    pub fn notifications(&self, username: &str) -> Vec<Notification> {
        let state = self.state.lock().unwrap();
        state
            .notifications
            .iter()
            .filter(|n| n.recipient == username)
            .cloned()
            .collect()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn read(&self) -> Result<std::sync::MutexGuard<'_, State>, sqlx::Error> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.state.lock().unwrap())
    }
}

fn in_window(at: Timestamp, since: Timestamp, until: Timestamp) -> bool {
    at > since && at <= until
}

#[async_trait]
impl SummaryStore for MemoryStore {
    async fn profile(&self, username: &str) -> Result<Option<UserProfile>, sqlx::Error> {
        let state = self.read()?;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn latest_digest_at_or_before(
        &self,
        username: &str,
        at: Timestamp,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        let state = self.read()?;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.recipient == username && n.is_digest() && n.created_at <= at)
            .map(|n| n.created_at)
            .max())
    }

    async fn chats(&self, username: &str) -> Result<Vec<ChatPeer>, sqlx::Error> {
        let state = self.read()?;
        Ok(state
            .chats
            .iter()
            .filter_map(|(id, a, b)| {
                let other = if a == username {
                    b
                } else if b == username {
                    a
                } else {
                    return None;
                };
                let deleted = state
                    .users
                    .iter()
                    .any(|u| &u.username == other && u.is_deleted());
                Some(ChatPeer {
                    chat_id: *id,
                    other_username: other.clone(),
                    other_display_name: other.clone(),
                    other_deleted: deleted,
                })
            })
            .collect())
    }

    async fn count_chat_messages(
        &self,
        chat_id: DbId,
        exclude_sender: &str,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let state = self.read()?;
        Ok(state
            .messages
            .iter()
            .filter(|(chat, sender, at)| {
                *chat == chat_id && sender != exclude_sender && in_window(*at, since, until)
            })
            .count() as i64)
    }

    async fn job_fairs(&self, username: &str) -> Result<Vec<JobFair>, sqlx::Error> {
        let state = self.read()?;
        Ok(state
            .fairs
            .iter()
            .filter(|(_, participants)| participants.iter().any(|p| p == username))
            .map(|(fair, _)| fair.clone())
            .collect())
    }

    async fn count_job_fair_updates(
        &self,
        username: &str,
        job_fair_id: DbId,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let state = self.read()?;
        Ok(state
            .notifications
            .iter()
            .filter(|n| {
                n.recipient == username
                    && n.category() == Some(Category::JobFair)
                    && n.related_id() == Some(job_fair_id)
                    && in_window(n.created_at, since, until)
            })
            .count() as i64)
    }

    async fn communities(&self) -> Result<Vec<Community>, sqlx::Error> {
        let state = self.read()?;
        let mut communities = state.communities.clone();
        communities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(communities)
    }

    async fn questions(
        &self,
        community_id: DbId,
        exclude_author: &str,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<Question>, sqlx::Error> {
        let state = self.read()?;
        Ok(state
            .questions
            .iter()
            .filter(|q| {
                q.community_id == community_id
                    && q.asked_by != exclude_author
                    && in_window(q.asked_at, since, until)
            })
            .cloned()
            .collect())
    }

    async fn find_notification(
        &self,
        id: DbId,
        username: &str,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let state = self.read()?;
        Ok(state
            .notifications
            .iter()
            .find(|n| n.id == id && n.recipient == username)
            .cloned())
    }

    async fn create_digest(&self, digest: &NewNotification) -> Result<Notification, sqlx::Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let created_at = digest.kind.window().map(|(_, end)| end).unwrap_or_else(Utc::now);
        Ok(self.add_notification(digest, created_at))
    }
}
