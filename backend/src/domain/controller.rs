//! The tracker controller.
//!
//! A single tokio task owns the [`TrackerState`]. Everything that changes it
//! arrives as a message on one inbox: user intents from the REST layer,
//! snapshots from the store subscriptions, and completions of the writes the
//! reducer asked for. Messages are reduced strictly one at a time, and the
//! rendered view is published on a `watch` channel after each one.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use shared::{Intent, ViewModel};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::commands::{Collection, Effect, Message};
use super::identity_service::IdentityService;
use super::state::{update, TrackerState};
use super::view::render;
use crate::storage::{StoreHandles, Subscription};

const INBOX_CAPACITY: usize = 256;

/// Source of "today" for newly submitted requests
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("the tracker controller has stopped")]
    Stopped,
}

enum Envelope {
    Message {
        message: Message,
        reply: Option<oneshot::Sender<ViewModel>>,
    },
    Shutdown,
}

/// Cloneable handle to a running controller
#[derive(Clone)]
pub struct ControllerHandle {
    inbox: mpsc::Sender<Envelope>,
    views: watch::Receiver<ViewModel>,
}

impl ControllerHandle {
    /// Apply an intent and return the view rendered right after it.
    ///
    /// Writes triggered by the intent are still in flight at that point;
    /// their outcome shows up in later views.
    pub async fn dispatch(&self, intent: Intent) -> Result<ViewModel, ControllerError> {
        let (reply, response) = oneshot::channel();
        self.inbox
            .send(Envelope::Message {
                message: Message::Intent(intent),
                reply: Some(reply),
            })
            .await
            .map_err(|_| ControllerError::Stopped)?;
        response.await.map_err(|_| ControllerError::Stopped)
    }

    pub fn current_view(&self) -> ViewModel {
        self.views.borrow().clone()
    }

    /// Receiver that observes every newly published view
    pub fn subscribe_views(&self) -> watch::Receiver<ViewModel> {
        self.views.clone()
    }

    /// Stop the controller and cancel its store subscriptions
    pub async fn shutdown(&self) {
        if self.inbox.send(Envelope::Shutdown).await.is_err() {
            debug!("Controller already stopped");
        }
    }
}

/// A store subscription forwarded into the inbox. Cancelled when dropped.
pub struct SubscriptionHandle {
    collection: Collection,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn cancel(&self) {
        debug!("Cancelling {} subscription", self.collection);
        self.task.abort();
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct TrackerController {
    state: TrackerState,
    store: StoreHandles,
    inbox: mpsc::Sender<Envelope>,
    views: watch::Sender<ViewModel>,
    subscriptions: Vec<SubscriptionHandle>,
    clock: Clock,
}

impl TrackerController {
    /// Start the controller task using the local date as "today"
    pub fn spawn(store: StoreHandles, identity: IdentityService) -> ControllerHandle {
        Self::spawn_with_clock(store, identity, Arc::new(|| Local::now().date_naive()))
    }

    pub fn spawn_with_clock(store: StoreHandles, identity: IdentityService, clock: Clock) -> ControllerHandle {
        let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_CAPACITY);
        let state = TrackerState::default();
        let (views_tx, views_rx) = watch::channel(render(&state));

        let controller = TrackerController {
            state,
            store,
            inbox: inbox_tx.clone(),
            views: views_tx,
            subscriptions: Vec::new(),
            clock,
        };
        tokio::spawn(controller.run(identity, inbox_rx));

        ControllerHandle {
            inbox: inbox_tx,
            views: views_rx,
        }
    }

    async fn run(mut self, identity: IdentityService, mut inbox: mpsc::Receiver<Envelope>) {
        let session = identity.sign_in().await;
        let user_id = session.user_id.clone();
        self.reduce(Message::AuthReady { user_id: user_id.clone() }, None);
        self.subscribe_all(&user_id).await;

        while let Some(envelope) = inbox.recv().await {
            match envelope {
                Envelope::Message { message, reply } => self.reduce(message, reply),
                Envelope::Shutdown => {
                    info!("Stopping tracker controller");
                    break;
                }
            }
        }

        for subscription in self.subscriptions.drain(..) {
            subscription.cancel();
        }
    }

    async fn subscribe_all(&mut self, user_id: &str) {
        let settings = self.store.settings.subscribe_settings(user_id).await;
        match settings {
            Ok(subscription) => self.forward(Collection::Settings, subscription, Message::SettingsLoaded),
            Err(e) => self.subscription_failed(Collection::Settings, e),
        }

        let requests = self.store.requests.subscribe_requests(user_id).await;
        match requests {
            Ok(subscription) => self.forward(Collection::VacationRequests, subscription, Message::RequestsLoaded),
            Err(e) => self.subscription_failed(Collection::VacationRequests, e),
        }

        let holidays = self.store.holidays.subscribe_holidays(user_id).await;
        match holidays {
            Ok(subscription) => self.forward(Collection::Holidays, subscription, Message::HolidaysLoaded),
            Err(e) => self.subscription_failed(Collection::Holidays, e),
        }
    }

    fn forward<T, F>(&mut self, collection: Collection, mut subscription: Subscription<T>, to_message: F)
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(T) -> Message + Send + 'static,
    {
        let inbox = self.inbox.clone();
        let task = tokio::spawn(async move {
            while let Some(snapshot) = subscription.next().await {
                let envelope = Envelope::Message {
                    message: to_message(snapshot),
                    reply: None,
                };
                if inbox.send(envelope).await.is_err() {
                    break;
                }
            }
        });
        self.subscriptions.push(SubscriptionHandle { collection, task });
    }

    fn subscription_failed(&mut self, collection: Collection, cause: anyhow::Error) {
        let cause = format!("{:#}", cause);
        self.reduce(Message::SubscriptionFailed { collection, cause }, None);
    }

    fn reduce(&mut self, message: Message, reply: Option<oneshot::Sender<ViewModel>>) {
        let today = (self.clock)();
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, message, today);
        self.state = state;

        for effect in effects {
            self.execute(effect);
        }

        let view = render(&self.state);
        self.views.send_replace(view.clone());
        if let Some(reply) = reply {
            let _ = reply.send(view);
        }
    }

    /// Run a write in the background and feed its outcome back into the inbox
    fn execute(&self, effect: Effect) {
        let Some(user_id) = self.state.user_id.clone() else {
            warn!("Dropping {:?}: no session", effect);
            return;
        };
        let store = self.store.clone();
        let inbox = self.inbox.clone();

        tokio::spawn(async move {
            let write = {
                let effect = effect.clone();
                tokio::spawn(async move { apply_effect(&store, &user_id, &effect).await })
            };
            // A panic in the write comes back as a failed write
            let result = match write.await {
                Ok(outcome) => outcome.map_err(|e| format!("{:#}", e)),
                Err(e) => Err(format!("write task failed: {}", e)),
            };
            let envelope = Envelope::Message {
                message: Message::WriteFinished { effect, result },
                reply: None,
            };
            if inbox.send(envelope).await.is_err() {
                debug!("Controller stopped before a write completed");
            }
        });
    }
}

async fn apply_effect(store: &StoreHandles, user_id: &str, effect: &Effect) -> Result<()> {
    match effect {
        Effect::AddRequest(request) => {
            store.requests.add_request(user_id, request).await?;
        }
        Effect::DeleteRequest { id } => {
            if !store.requests.delete_request(user_id, id).await? {
                warn!("Request {} was already gone", id);
            }
        }
        Effect::SaveSettings(patch) => store.settings.merge_settings(user_id, patch).await?,
        Effect::PutHoliday(holiday) => store.holidays.put_holiday(user_id, holiday).await?,
        Effect::DeleteHoliday { date } => {
            if !store.holidays.delete_holiday(user_id, *date).await? {
                warn!("No holiday stored on {}", date);
            }
        }
    }
    Ok(())
}

/// Wait until the published view satisfies `predicate`
#[cfg(test)]
pub(crate) async fn wait_for_view<F>(handle: &ControllerHandle, predicate: F) -> ViewModel
where
    F: FnMut(&ViewModel) -> bool,
{
    let mut views = handle.subscribe_views();
    let wait = async move { views.wait_for(predicate).await.map(|view| view.clone()) };
    match tokio::time::timeout(std::time::Duration::from_secs(5), wait).await {
        Ok(Ok(view)) => view,
        Ok(Err(_)) => panic!("controller stopped while waiting for a view"),
        Err(_) => panic!("timed out waiting for view; last view: {:?}", handle.current_view()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{parse_date, Holiday};
    use crate::storage::csv::test_utils::TestEnvironment;
    use crate::domain::models::{NewVacationRequest, VacationRequest};
    use crate::storage::RequestStorage;
    use async_trait::async_trait;
    use shared::{ErrorKind, RequestStatus, ViewKind};

    fn spawn(env: &TestEnvironment) -> ControllerHandle {
        let identity = IdentityService::new(&env.base_path, Some("user-1".to_string()));
        let today = parse_date("2024-12-01").unwrap();
        TrackerController::spawn_with_clock(env.store(), identity, Arc::new(move || today))
    }

    async fn ready(handle: &ControllerHandle) -> ViewModel {
        wait_for_view(handle, |view| view.auth_ready && view.summary.available_days > 0).await
    }

    async fn set_range(handle: &ControllerHandle, start: &str, end: &str) -> ViewModel {
        handle
            .dispatch(Intent::SetStartDate { value: start.to_string() })
            .await
            .unwrap();
        handle
            .dispatch(Intent::SetEndDate { value: end.to_string() })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_starts_with_default_allotment() {
        let env = TestEnvironment::new().unwrap();
        let handle = spawn(&env);

        let view = ready(&handle).await;
        assert_eq!(view.user_id.as_deref(), Some("user-1"));
        assert_eq!(view.summary.available_days, 22);
        assert_eq!(view.summary.remaining_days, 22);
        assert!(view.dashboard.requests.is_empty());
    }

    #[tokio::test]
    async fn test_submit_request_round_trip() {
        let env = TestEnvironment::new().unwrap();
        env.store()
            .holidays
            .put_holiday("user-1", &Holiday::new("Christmas", parse_date("2024-12-25").unwrap()))
            .await
            .unwrap();
        let handle = spawn(&env);
        ready(&handle).await;
        wait_for_view(&handle, |view| view.config.holidays.len() == 1).await;

        let view = set_range(&handle, "2024-12-23", "2024-12-27").await;
        assert_eq!(view.dashboard.calculated_days, 4);
        assert!(view.dashboard.can_submit);

        let view = handle.dispatch(Intent::SubmitRequest).await.unwrap();
        assert!(view.is_saving);
        assert!(!view.dashboard.can_submit);

        let view = wait_for_view(&handle, |view| !view.is_saving && view.dashboard.requests.len() == 1).await;
        let row = &view.dashboard.requests[0];
        assert_eq!(row.days, 4);
        assert_eq!(row.status, RequestStatus::Pending);
        assert_eq!(row.requested_on, "2024-12-01");
        assert_eq!(view.summary.pending_days, 4);
        assert_eq!(view.summary.remaining_days, 18);
        assert_eq!(view.dashboard.start_date, "");
        assert_eq!(view.dashboard.end_date, "");
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn test_rejects_request_beyond_balance() {
        let env = TestEnvironment::new().unwrap();
        let handle = spawn(&env);
        ready(&handle).await;

        handle.dispatch(Intent::Navigate { view: ViewKind::Config }).await.unwrap();
        handle.dispatch(Intent::SetAllotment { value: "3".to_string() }).await.unwrap();
        handle.dispatch(Intent::SaveAllotment).await.unwrap();
        wait_for_view(&handle, |view| view.summary.available_days == 3 && !view.is_saving).await;

        set_range(&handle, "2024-12-02", "2024-12-06").await;
        let view = handle.dispatch(Intent::SubmitRequest).await.unwrap();
        let error = view.error.unwrap();
        assert_eq!(error.kind, ErrorKind::InsufficientBalance);
        assert!(error.message.contains('3'));
        assert!(env.store().requests.list_requests("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_allotment_returns_to_dashboard() {
        let env = TestEnvironment::new().unwrap();
        let handle = spawn(&env);
        ready(&handle).await;

        let view = handle.dispatch(Intent::Navigate { view: ViewKind::Config }).await.unwrap();
        assert_eq!(view.config.allotment_draft, "22");

        handle.dispatch(Intent::SetAllotment { value: "30.9".to_string() }).await.unwrap();
        let view = handle.dispatch(Intent::SaveAllotment).await.unwrap();
        assert!(view.is_saving);

        let view = wait_for_view(&handle, |view| view.view == ViewKind::Dashboard && !view.is_saving).await;
        assert_eq!(view.summary.available_days, 30);
        let stored = env.store().settings.get_settings("user-1").await.unwrap();
        assert_eq!(stored.map(|s| s.available_days), Some(30));
    }

    #[tokio::test]
    async fn test_external_status_change_updates_summary() {
        let env = TestEnvironment::new().unwrap();
        let handle = spawn(&env);
        ready(&handle).await;

        set_range(&handle, "2024-12-02", "2024-12-03").await;
        handle.dispatch(Intent::SubmitRequest).await.unwrap();
        let view = wait_for_view(&handle, |view| view.dashboard.requests.len() == 1).await;
        let id = view.dashboard.requests[0].id.clone();

        env.store()
            .requests
            .update_request_status("user-1", &id, RequestStatus::Approved)
            .await
            .unwrap();

        let view = wait_for_view(&handle, |view| view.summary.approved_days == 2).await;
        assert_eq!(view.summary.pending_days, 0);
        assert!(!view.dashboard.requests[0].can_cancel);
    }

    #[tokio::test]
    async fn test_cancel_pending_request() {
        let env = TestEnvironment::new().unwrap();
        let handle = spawn(&env);
        ready(&handle).await;

        set_range(&handle, "2024-12-02", "2024-12-03").await;
        handle.dispatch(Intent::SubmitRequest).await.unwrap();
        let view = wait_for_view(&handle, |view| view.dashboard.requests.len() == 1 && !view.is_saving).await;
        let id = view.dashboard.requests[0].id.clone();

        handle.dispatch(Intent::CancelRequest { id }).await.unwrap();
        let view = wait_for_view(&handle, |view| view.dashboard.requests.is_empty()).await;
        assert_eq!(view.summary.remaining_days, 22);
    }

    #[tokio::test]
    async fn test_holiday_add_and_delete() {
        let env = TestEnvironment::new().unwrap();
        let handle = spawn(&env);
        ready(&handle).await;

        handle.dispatch(Intent::Navigate { view: ViewKind::Config }).await.unwrap();
        handle.dispatch(Intent::SetHolidayName { value: "Christmas".to_string() }).await.unwrap();
        handle.dispatch(Intent::SetHolidayDate { value: "2024-12-25".to_string() }).await.unwrap();
        handle.dispatch(Intent::AddHoliday).await.unwrap();

        let view = wait_for_view(&handle, |view| view.config.holidays.len() == 1 && !view.is_saving).await;
        assert_eq!(view.config.holidays[0].name, "Christmas");
        assert_eq!(view.config.holiday_name, "");

        handle
            .dispatch(Intent::DeleteHoliday { date: "2024-12-25".to_string() })
            .await
            .unwrap();
        wait_for_view(&handle, |view| view.config.holidays.is_empty()).await;
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown_fails() {
        let env = TestEnvironment::new().unwrap();
        let handle = spawn(&env);
        ready(&handle).await;

        handle.shutdown().await;
        let result = handle.dispatch(Intent::SubmitRequest).await;
        assert!(matches!(result, Err(ControllerError::Stopped)));
    }

    /// Request store whose inserts panic mid-write
    struct PanickingRequests {
        inner: Arc<dyn RequestStorage>,
    }

    #[async_trait]
    impl RequestStorage for PanickingRequests {
        async fn list_requests(&self, user_id: &str) -> Result<Vec<VacationRequest>> {
            self.inner.list_requests(user_id).await
        }

        async fn add_request(&self, _user_id: &str, _request: &NewVacationRequest) -> Result<VacationRequest> {
            panic!("disk on fire");
        }

        async fn update_request_status(&self, user_id: &str, request_id: &str, status: RequestStatus) -> Result<bool> {
            self.inner.update_request_status(user_id, request_id, status).await
        }

        async fn delete_request(&self, user_id: &str, request_id: &str) -> Result<bool> {
            self.inner.delete_request(user_id, request_id).await
        }

        async fn subscribe_requests(&self, user_id: &str) -> Result<Subscription<Vec<VacationRequest>>> {
            self.inner.subscribe_requests(user_id).await
        }
    }

    #[tokio::test]
    async fn test_panicking_write_releases_saving_flag() {
        let env = TestEnvironment::new().unwrap();
        let mut store = env.store();
        store.requests = Arc::new(PanickingRequests { inner: store.requests.clone() });
        let identity = IdentityService::new(&env.base_path, Some("user-1".to_string()));
        let today = parse_date("2024-12-01").unwrap();
        let handle = TrackerController::spawn_with_clock(store, identity, Arc::new(move || today));
        ready(&handle).await;

        set_range(&handle, "2024-12-23", "2024-12-27").await;
        let view = handle.dispatch(Intent::SubmitRequest).await.unwrap();
        assert!(view.is_saving);

        let view = wait_for_view(&handle, |view| !view.is_saving).await;
        assert_eq!(view.error.map(|e| e.kind), Some(ErrorKind::PersistenceFailure));
        assert_eq!(view.dashboard.start_date, "2024-12-23");
        assert!(view.dashboard.requests.is_empty());

        // The controller keeps serving intents afterwards
        let view = handle.dispatch(Intent::Navigate { view: ViewKind::Config }).await.unwrap();
        assert_eq!(view.view, ViewKind::Config);
    }
}
