//! Delivery Controller.
//!
//! Drives one [`NotificationSession`] through `Idle -> Syncing -> Live`:
//! a full fetch on start, then a push listener and a poll timer that both
//! merge into the session by id. Every local change is published on a
//! `watch` channel for the UI. Store calls follow the local change and
//! their failures are logged without rolling it back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use herald_core::notification::Notification;
use herald_core::preferences::NotificationPreferences;
use herald_core::summary::SummaryBreakdown;
use herald_core::types::DbId;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::api::{ClientError, NotificationApi, PreferencesUpdate};
use crate::config::PollConfig;
use crate::push::PushChannel;
use crate::session::{InboxSnapshot, NotificationSession, Popup};
use crate::view::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Syncing,
    Live,
}

/// Handle to a running delivery pipeline. Cheap to clone.
#[derive(Clone)]
pub struct DeliveryController {
    inner: Arc<Inner>,
}

struct Inner {
    username: String,
    api: Arc<dyn NotificationApi>,
    push: Arc<dyn PushChannel>,
    poll: PollConfig,
    session: Mutex<NotificationSession>,
    state: StdMutex<ControllerState>,
    snapshot_tx: watch::Sender<InboxSnapshot>,
    /// Bumped on every start and stop; tasks from an older start never
    /// touch the session.
    epoch: AtomicU64,
    running: Mutex<Option<Running>>,
}

struct Running {
    cancel: CancellationToken,
    tracker: TaskTracker,
}

/// What background tasks need to apply their results.
#[derive(Clone)]
struct TaskContext {
    inner: Arc<Inner>,
    epoch: u64,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl DeliveryController {
    pub fn new(
        session: NotificationSession,
        api: Arc<dyn NotificationApi>,
        push: Arc<dyn PushChannel>,
        poll: PollConfig,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(session.snapshot());
        Self {
            inner: Arc::new(Inner {
                username: session.username().to_string(),
                api,
                push,
                poll,
                session: Mutex::new(session),
                state: StdMutex::new(ControllerState::Idle),
                snapshot_tx,
                epoch: AtomicU64::new(0),
                running: Mutex::new(None),
            }),
        }
    }

    pub fn username(&self) -> &str {
        &self.inner.username
    }

    pub fn state(&self) -> ControllerState {
        *self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest published inbox.
    pub fn snapshot(&self) -> InboxSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Subscribe to inbox changes.
    pub fn watch(&self) -> watch::Receiver<InboxSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Sync the inbox and go live. Starting a live controller is a no-op.
    ///
    /// Fails only if the initial fetch fails; a push channel that cannot be
    /// opened leaves the controller live on polling alone.
    pub async fn start(&self) -> Result<(), ClientError> {
        let mut running = self.inner.running.lock().await;
        if running.is_some() {
            return Ok(());
        }

        self.inner.set_state(ControllerState::Syncing);
        let ctx = TaskContext {
            inner: Arc::clone(&self.inner),
            epoch: self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
        };

        if let Err(e) = self.inner.sync().await {
            tracing::error!(user = %self.inner.username, error = %e, "Initial notification sync failed");
            self.inner.set_state(ControllerState::Idle);
            return Err(e);
        }

        match self.inner.push.subscribe(&self.inner.username).await {
            Ok(rx) => {
                ctx.tracker.spawn(push_listener(ctx.clone(), rx));
            }
            Err(e) => {
                tracing::warn!(
                    user = %self.inner.username,
                    error = %e,
                    "Push channel unavailable, relying on polling"
                );
            }
        }
        ctx.tracker.spawn(poll_loop(ctx.clone()));

        *running = Some(Running {
            cancel: ctx.cancel,
            tracker: ctx.tracker,
        });
        self.inner.set_state(ControllerState::Live);
        tracing::info!(user = %self.inner.username, "Delivery controller live");
        Ok(())
    }

    /// Tear down the push listener, poll timer and pop-up timers. Nothing
    /// they were doing is applied after this returns, and the session starts
    /// from a clean view on the next `start`.
    pub async fn stop(&self) {
        let Some(running) = self.inner.running.lock().await.take() else {
            return;
        };
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        running.cancel.cancel();
        running.tracker.close();

        if let Err(e) = self.inner.push.unsubscribe(&self.inner.username).await {
            tracing::warn!(user = %self.inner.username, error = %e, "Push unsubscribe failed");
        }
        running.tracker.wait().await;

        {
            let mut session = self.inner.session.lock().await;
            session.reset();
            self.inner.publish(&session);
        }
        self.inner.set_state(ControllerState::Idle);
        tracing::info!(user = %self.inner.username, "Delivery controller stopped");
    }

    /// Follow a navigation change.
    pub async fn navigate(&self, path: &str) -> Route {
        let route = Route::parse(path);
        let acknowledge = {
            let mut session = self.inner.session.lock().await;
            let acknowledge = session.navigate(route);
            self.inner.publish(&session);
            acknowledge
        };
        self.inner.acknowledge(acknowledge).await;
        route
    }

    pub async fn mark_read(&self, id: DbId) -> Result<(), ClientError> {
        {
            let mut session = self.inner.session.lock().await;
            if session.mark_read_local(id) {
                self.inner.publish(&session);
            }
        }
        self.inner.api.mark_read(id).await.inspect_err(|e| {
            tracing::warn!(notification_id = id, error = %e, "Failed to mark notification read");
        })
    }

    pub async fn mark_all_read(&self) -> Result<u64, ClientError> {
        {
            let mut session = self.inner.session.lock().await;
            session.mark_all_read_local();
            self.inner.publish(&session);
        }
        self.inner.api.mark_all_read().await.inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to mark all notifications read");
        })
    }

    /// Clear the inbox locally and in the store, then re-fetch.
    pub async fn clear_all(&self) -> Result<(), ClientError> {
        {
            let mut session = self.inner.session.lock().await;
            session.clear_local();
            self.inner.publish(&session);
        }
        let cleared = self.inner.api.clear_all().await.inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to clear notifications");
        })?;
        tracing::debug!(cleared, "Notifications cleared");
        self.inner.refetch().await
    }

    pub async fn update_preferences(
        &self,
        update: &PreferencesUpdate,
    ) -> Result<NotificationPreferences, ClientError> {
        let preferences = self.inner.api.update_preferences(update).await?;
        let mut session = self.inner.session.lock().await;
        session.set_preferences(preferences.clone());
        self.inner.publish(&session);
        Ok(preferences)
    }

    /// Structured detail of a digest in the inbox.
    pub async fn summary(&self, digest_id: DbId) -> Result<SummaryBreakdown, ClientError> {
        self.inner.api.summary(digest_id).await
    }
}

impl Inner {
    fn set_state(&self, state: ControllerState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn publish(&self, session: &NotificationSession) {
        self.snapshot_tx.send_replace(session.snapshot());
    }

    /// Load preferences and the full inbox.
    async fn sync(&self) -> Result<(), ClientError> {
        let preferences = self.api.preferences().await?;
        self.session.lock().await.set_preferences(preferences);
        self.refetch().await
    }

    async fn refetch(&self) -> Result<(), ClientError> {
        let list = self.fetch_all(false).await?;
        let acknowledge = {
            let mut session = self.session.lock().await;
            let acknowledge = session.load(list);
            self.publish(&session);
            acknowledge
        };
        self.acknowledge(acknowledge).await;
        Ok(())
    }

    /// Page through the inbox until the store runs out of rows.
    ///
    /// The offset advances by what each page actually returned, so a store
    /// that caps the page below `page_size` is still read to the end.
    async fn fetch_all(&self, unread_only: bool) -> Result<Vec<Notification>, ClientError> {
        let limit = self.poll.page_size.max(1);
        let mut all = Vec::new();
        loop {
            let page = self.api.list(unread_only, limit, all.len() as i64).await?;
            if page.is_empty() {
                break;
            }
            all.extend(page);
        }
        Ok(all)
    }

    /// Mark suppressed or auto-acknowledged notifications read in the store.
    async fn acknowledge(&self, ids: Vec<DbId>) {
        for id in ids {
            if let Err(e) = self.api.mark_read(id).await {
                tracing::warn!(notification_id = id, error = %e, "Failed to acknowledge notification");
            }
        }
    }
}

impl TaskContext {
    fn is_current(&self) -> bool {
        !self.cancel.is_cancelled() && self.inner.epoch.load(Ordering::SeqCst) == self.epoch
    }

    async fn apply(&self, incoming: Vec<Notification>) {
        let outcome = {
            let mut session = self.inner.session.lock().await;
            if !self.is_current() {
                return;
            }
            let outcome = session.merge(incoming);
            if outcome.added > 0 {
                self.inner.publish(&session);
            }
            outcome
        };

        if let Some(popup) = outcome.popup {
            self.tracker.spawn(dismiss_popup_after(self.clone(), popup));
        }
        self.inner.acknowledge(outcome.acknowledge).await;
    }
}

async fn push_listener(ctx: TaskContext, mut rx: mpsc::Receiver<Notification>) {
    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            msg = rx.recv() => match msg {
                Some(notification) => ctx.apply(vec![notification]).await,
                None => {
                    tracing::warn!(user = %ctx.inner.username, "Push channel closed, relying on polling");
                    break;
                }
            },
        }
    }
}

/// Fetch unread notifications on an interval chosen by the delivery mode.
async fn poll_loop(ctx: TaskContext) {
    loop {
        let interval = {
            let session = ctx.inner.session.lock().await;
            ctx.inner.poll.interval_for(session.delivery_mode())
        };
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {
                match ctx.inner.fetch_all(true).await {
                    Ok(list) => ctx.apply(list).await,
                    Err(e) => {
                        tracing::warn!(user = %ctx.inner.username, error = %e, "Notification poll failed");
                    }
                }
            }
        }
    }
}

async fn dismiss_popup_after(ctx: TaskContext, popup: Popup) {
    tokio::select! {
        _ = ctx.cancel.cancelled() => {}
        _ = tokio::time::sleep(popup.duration) => {
            let mut session = ctx.inner.session.lock().await;
            if ctx.is_current() && session.dismiss_popup(popup.notification.id) {
                ctx.inner.publish(&session);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use herald_core::notification::{Category, NotificationKind};

    use super::*;
    use crate::api::UnreadCounts;

    fn notification(id: DbId, category: Category, related_id: DbId) -> Notification {
        Notification {
            id,
            recipient: "bob".into(),
            kind: NotificationKind::Ordinary {
                category,
                related_id: Some(related_id),
            },
            title: "New message".into(),
            message: format!("event {id}"),
            read: false,
            created_at: Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, id as u32).unwrap(),
        }
    }

    #[derive(Default)]
    struct FakeApi {
        inbox: StdMutex<Vec<Notification>>,
        marked: StdMutex<Vec<DbId>>,
        list_calls: StdMutex<usize>,
        fail_mark_read: bool,
    }

    impl FakeApi {
        fn with_inbox(inbox: Vec<Notification>) -> Self {
            Self {
                inbox: StdMutex::new(inbox),
                ..Default::default()
            }
        }

        fn marked(&self) -> Vec<DbId> {
            self.marked.lock().unwrap().clone()
        }

        fn list_calls(&self) -> usize {
            *self.list_calls.lock().unwrap()
        }
    }

    fn unavailable() -> ClientError {
        ClientError::Api {
            status: 503,
            body: "unavailable".into(),
        }
    }

    #[async_trait]
    impl NotificationApi for FakeApi {
        async fn list(
            &self,
            unread_only: bool,
            limit: i64,
            offset: i64,
        ) -> Result<Vec<Notification>, ClientError> {
            *self.list_calls.lock().unwrap() += 1;
            let inbox = self.inbox.lock().unwrap();
            Ok(inbox
                .iter()
                .filter(|n| !unread_only || !n.read)
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn unread_counts(&self) -> Result<UnreadCounts, ClientError> {
            Ok(UnreadCounts::default())
        }

        async fn mark_read(&self, id: DbId) -> Result<(), ClientError> {
            if self.fail_mark_read {
                return Err(unavailable());
            }
            self.marked.lock().unwrap().push(id);
            for n in self.inbox.lock().unwrap().iter_mut().filter(|n| n.id == id) {
                n.read = true;
            }
            Ok(())
        }

        async fn mark_all_read(&self) -> Result<u64, ClientError> {
            Ok(0)
        }

        async fn clear_all(&self) -> Result<u64, ClientError> {
            let mut inbox = self.inbox.lock().unwrap();
            let cleared = inbox.len() as u64;
            inbox.clear();
            Ok(cleared)
        }

        async fn summary(&self, digest_id: DbId) -> Result<SummaryBreakdown, ClientError> {
            Err(ClientError::Api {
                status: 404,
                body: format!("no digest {digest_id}"),
            })
        }

        async fn preferences(&self) -> Result<NotificationPreferences, ClientError> {
            Ok(NotificationPreferences::default())
        }

        async fn update_preferences(
            &self,
            _update: &PreferencesUpdate,
        ) -> Result<NotificationPreferences, ClientError> {
            Ok(NotificationPreferences::default())
        }
    }

    #[derive(Default)]
    struct FakePush {
        sender: StdMutex<Option<mpsc::Sender<Notification>>>,
        refuse: bool,
    }

    impl FakePush {
        async fn deliver(&self, notification: Notification) {
            let sender = self.sender.lock().unwrap().clone();
            if let Some(tx) = sender {
                let _ = tx.send(notification).await;
            }
        }
    }

    #[async_trait]
    impl PushChannel for FakePush {
        async fn subscribe(
            &self,
            _username: &str,
        ) -> Result<mpsc::Receiver<Notification>, ClientError> {
            if self.refuse {
                return Err(ClientError::Push("refused".into()));
            }
            let (tx, rx) = mpsc::channel(16);
            *self.sender.lock().unwrap() = Some(tx);
            Ok(rx)
        }

        async fn unsubscribe(&self, _username: &str) -> Result<(), ClientError> {
            self.sender.lock().unwrap().take();
            Ok(())
        }
    }

    fn controller(api: Arc<FakeApi>, push: Arc<FakePush>) -> DeliveryController {
        let poll = PollConfig {
            immediate_interval: Duration::from_millis(20),
            digest_interval: Duration::from_millis(20),
            page_size: 50,
        };
        DeliveryController::new(
            NotificationSession::new("bob", NotificationPreferences::default()),
            api,
            push,
            poll,
        )
    }

    /// Wait until the published snapshot satisfies `predicate`.
    async fn wait_for(
        controller: &DeliveryController,
        predicate: impl Fn(&InboxSnapshot) -> bool,
    ) -> InboxSnapshot {
        let mut rx = controller.watch();
        let snapshot = tokio::time::timeout(Duration::from_secs(30), rx.wait_for(|s| predicate(s)))
            .await
            .expect("timed out waiting for snapshot")
            .expect("controller dropped");
        snapshot.clone()
    }

    // ---- Test: start loads the inbox and goes live ----

    #[tokio::test]
    async fn start_loads_inbox() {
        let api = Arc::new(FakeApi::with_inbox(vec![
            notification(1, Category::Dm, 10),
            notification(2, Category::Community, 20),
        ]));
        let ctl = controller(Arc::clone(&api), Arc::new(FakePush::default()));
        assert_eq!(ctl.state(), ControllerState::Idle);

        ctl.start().await.unwrap();
        assert_eq!(ctl.state(), ControllerState::Live);

        let snapshot = ctl.snapshot();
        assert_eq!(snapshot.unread_count, 2);
        let ids: Vec<DbId> = snapshot.visible.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 1]);

        ctl.stop().await;
        assert_eq!(ctl.state(), ControllerState::Idle);
    }

    // ---- Test: pushed notifications reach the snapshot once ----

    #[tokio::test]
    async fn pushed_notification_is_merged_once() {
        let api = Arc::new(FakeApi::default());
        let push = Arc::new(FakePush::default());
        let ctl = controller(Arc::clone(&api), Arc::clone(&push));
        ctl.start().await.unwrap();

        let dm = notification(5, Category::Dm, 10);
        api.inbox.lock().unwrap().push(dm.clone());
        push.deliver(dm).await;

        let snapshot = wait_for(&ctl, |s| s.unread_count == 1).await;
        assert_eq!(snapshot.visible.len(), 1);
        assert_eq!(snapshot.popup.as_ref().map(|p| p.notification.id), Some(5));

        // The poll sees the same row; it must not be counted again.
        let calls = api.list_calls();
        tokio::time::timeout(Duration::from_secs(5), async {
            while api.list_calls() < calls + 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(ctl.snapshot().unread_count, 1);

        ctl.stop().await;
    }

    // ---- Test: a DM for the open chat is hidden and acknowledged ----

    #[tokio::test]
    async fn dm_for_open_chat_is_suppressed() {
        let api = Arc::new(FakeApi::default());
        let push = Arc::new(FakePush::default());
        let ctl = controller(Arc::clone(&api), Arc::clone(&push));
        ctl.start().await.unwrap();

        assert_eq!(ctl.navigate("/chats/10").await, Route::Chat(10));
        push.deliver(notification(7, Category::Dm, 10)).await;
        push.deliver(notification(8, Category::Dm, 11)).await;

        let snapshot = wait_for(&ctl, |s| s.visible.iter().any(|n| n.id == 8)).await;
        assert!(snapshot.visible.iter().all(|n| n.id != 7));
        assert_eq!(snapshot.unread_count, 1);

        tokio::time::timeout(Duration::from_secs(5), async {
            while !api.marked().contains(&7) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        // Leaving the chat does not bring it back.
        ctl.navigate("/notifications").await;
        assert!(ctl.snapshot().visible.iter().all(|n| n.id != 7));

        ctl.stop().await;
    }

    // ---- Test: nothing is applied after stop ----

    #[tokio::test]
    async fn stop_cancels_background_work() {
        let api = Arc::new(FakeApi::default());
        let push = Arc::new(FakePush::default());
        let ctl = controller(Arc::clone(&api), Arc::clone(&push));
        ctl.start().await.unwrap();
        ctl.stop().await;

        api.inbox
            .lock()
            .unwrap()
            .push(notification(9, Category::Community, 3));
        push.deliver(notification(9, Category::Community, 3)).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(ctl.snapshot().visible.is_empty());
        assert_eq!(ctl.state(), ControllerState::Idle);
    }

    // ---- Test: a refused push channel falls back to polling ----

    #[tokio::test]
    async fn polling_covers_missing_push() {
        let api = Arc::new(FakeApi::default());
        let push = Arc::new(FakePush {
            refuse: true,
            ..Default::default()
        });
        let ctl = controller(Arc::clone(&api), push);
        ctl.start().await.unwrap();
        assert_eq!(ctl.state(), ControllerState::Live);

        api.inbox
            .lock()
            .unwrap()
            .push(notification(3, Category::JobFair, 4));
        let snapshot = wait_for(&ctl, |s| s.unread_count == 1).await;
        assert_eq!(snapshot.visible[0].id, 3);

        ctl.stop().await;
    }

    // ---- Test: local read state survives a failing store ----

    #[tokio::test]
    async fn mark_read_is_optimistic() {
        let api = Arc::new(FakeApi {
            inbox: StdMutex::new(vec![notification(1, Category::Dm, 10)]),
            fail_mark_read: true,
            ..Default::default()
        });
        let ctl = controller(Arc::clone(&api), Arc::new(FakePush::default()));
        ctl.start().await.unwrap();
        assert_eq!(ctl.snapshot().unread_count, 1);

        assert_matches!(ctl.mark_read(1).await, Err(ClientError::Api { status: 503, .. }));
        assert_eq!(ctl.snapshot().unread_count, 0);

        ctl.stop().await;
    }

    // ---- Test: clear empties the inbox and re-fetches ----

    #[tokio::test]
    async fn clear_all_refetches() {
        let api = Arc::new(FakeApi::with_inbox(vec![
            notification(1, Category::Dm, 10),
            notification(2, Category::Dm, 10),
        ]));
        let ctl = controller(Arc::clone(&api), Arc::new(FakePush::default()));
        ctl.start().await.unwrap();
        let calls = api.list_calls();

        ctl.clear_all().await.unwrap();

        assert!(api.list_calls() > calls);
        let snapshot = ctl.snapshot();
        assert!(snapshot.visible.is_empty());
        assert_eq!(snapshot.unread_count, 0);

        ctl.stop().await;
    }

    // ---- Test: an inbox larger than one page is loaded in full ----

    #[tokio::test]
    async fn start_pages_through_large_inbox() {
        let inbox = (1..=59)
            .map(|id| notification(id, Category::Community, id))
            .collect();
        let api = Arc::new(FakeApi::with_inbox(inbox));
        let ctl = controller(Arc::clone(&api), Arc::new(FakePush::default()));

        ctl.start().await.unwrap();

        let snapshot = ctl.snapshot();
        assert_eq!(snapshot.unread_count, 59);
        assert_eq!(snapshot.visible.len(), 59);
        assert_eq!(snapshot.visible.first().map(|n| n.id), Some(59));
        assert_eq!(snapshot.visible.last().map(|n| n.id), Some(1));

        ctl.stop().await;
    }

    // ---- Test: polling reaches rows past the first page ----

    #[tokio::test]
    async fn poll_pages_past_first_page() {
        let api = Arc::new(FakeApi::default());
        let push = Arc::new(FakePush {
            refuse: true,
            ..Default::default()
        });
        let ctl = controller(Arc::clone(&api), push);
        ctl.start().await.unwrap();

        api.inbox
            .lock()
            .unwrap()
            .extend((1..=55).map(|id| notification(id, Category::JobFair, id)));

        let snapshot = wait_for(&ctl, |s| s.unread_count == 55).await;
        assert!(snapshot.visible.iter().any(|n| n.id == 55));

        ctl.stop().await;
    }

    // ---- Test: a restart does not inherit the previous view ----

    #[tokio::test]
    async fn restart_begins_with_clean_session() {
        let api = Arc::new(FakeApi::with_inbox(vec![notification(7, Category::Dm, 10)]));
        let push = Arc::new(FakePush::default());
        let ctl = controller(Arc::clone(&api), Arc::clone(&push));
        ctl.start().await.unwrap();

        ctl.navigate("/chats/10").await;
        assert!(ctl.snapshot().visible.is_empty());
        ctl.stop().await;

        let stopped = ctl.snapshot();
        assert!(stopped.visible.is_empty());
        assert!(stopped.popup.is_none());

        // Opening the chat acknowledged it in the store; make it unread again.
        api.inbox.lock().unwrap()[0].read = false;
        ctl.start().await.unwrap();

        let snapshot = ctl.snapshot();
        assert_eq!(snapshot.visible.iter().map(|n| n.id).collect::<Vec<_>>(), vec![7]);
        assert_eq!(snapshot.unread_count, 1);

        ctl.stop().await;
    }

    // ---- Test: pop-ups dismiss themselves ----

    #[tokio::test(start_paused = true)]
    async fn popup_dismisses_after_duration() {
        let api = Arc::new(FakeApi::default());
        let push = Arc::new(FakePush::default());
        let ctl = controller(Arc::clone(&api), Arc::clone(&push));
        ctl.start().await.unwrap();

        push.deliver(notification(4, Category::Community, 2)).await;
        wait_for(&ctl, |s| s.popup.is_some()).await;

        let snapshot = wait_for(&ctl, |s| s.popup.is_none()).await;
        assert_eq!(snapshot.unread_count, 1);

        ctl.stop().await;
    }
}
