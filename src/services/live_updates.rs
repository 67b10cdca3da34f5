use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::EventStreamError;
use crate::events::{conversation_topic, EventStream, EventSubscription, SubscriptionStatus};
use crate::models::Message;
use crate::notify::Notifier;
use crate::store::MessageStore;

/// View-level subscription lifecycle. `Closed` is reached only through
/// explicit teardown, never from a degraded state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    Idle,
    Subscribing,
    Subscribed,
    Degraded,
    Closed,
}

/// Callback invoked with each hydrated live message.
pub type OnInsert = Arc<dyn Fn(Message) -> BoxFuture<'static, ()> + Send + Sync>;

/// Attaches to the append-event stream for one conversation, hydrates each
/// notified event into a full record through the store, and forwards it.
pub struct LiveUpdateSubscriber {
    store: Arc<dyn MessageStore>,
    events: Arc<dyn EventStream>,
    notifier: Arc<dyn Notifier>,
}

impl LiveUpdateSubscriber {
    pub fn new(
        store: Arc<dyn MessageStore>,
        events: Arc<dyn EventStream>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            events,
            notifier,
        }
    }

    /// Open one long-lived subscription scoped to the conversation topic.
    /// The returned handle owns the worker task; there is exactly one
    /// handle per open conversation view.
    pub async fn subscribe(
        &self,
        conversation_id: Uuid,
        on_insert: OnInsert,
    ) -> Result<LiveHandle, EventStreamError> {
        let subscription = self
            .events
            .subscribe(&conversation_topic(conversation_id))
            .await?;

        let closed = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(Notify::new());
        let (state_tx, state_rx) = watch::channel(SubscriptionState::Idle);

        let worker = tokio::spawn(run_subscription(
            conversation_id,
            subscription,
            Arc::clone(&self.store),
            Arc::clone(&self.notifier),
            on_insert,
            state_tx,
            Arc::clone(&closed),
            Arc::clone(&shutdown),
        ));

        Ok(LiveHandle {
            conversation_id,
            closed,
            shutdown,
            state: state_rx,
            worker,
        })
    }
}

/// Ownership record for one live subscription.
pub struct LiveHandle {
    conversation_id: Uuid,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    state: watch::Receiver<SubscriptionState>,
    worker: JoinHandle<()>,
}

impl LiveHandle {
    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }

    pub fn state(&self) -> SubscriptionState {
        self.state.borrow().clone()
    }

    /// Release the subscription. Safe to call repeatedly; only the first
    /// call does anything.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.notify_one();
        debug!(conversation_id = %self.conversation_id, "live subscription released");
    }
}

impl Drop for LiveHandle {
    fn drop(&mut self) {
        self.close();
        self.worker.abort();
    }
}

fn apply_status(
    status: SubscriptionStatus,
    state_tx: &watch::Sender<SubscriptionState>,
    notifier: &Arc<dyn Notifier>,
    conversation_id: Uuid,
) {
    match status {
        SubscriptionStatus::Subscribing => {
            let _ = state_tx.send(SubscriptionState::Subscribing);
        }
        SubscriptionStatus::Subscribed => {
            let _ = state_tx.send(SubscriptionState::Subscribed);
        }
        SubscriptionStatus::Degraded(reason) => {
            let _ = state_tx.send(SubscriptionState::Degraded);
            warn!(%conversation_id, reason = %reason, "live updates degraded");
            notifier.warn(&format!(
                "Live updates are degraded for this conversation; showing the last loaded messages ({reason})"
            ));
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_subscription(
    conversation_id: Uuid,
    subscription: EventSubscription,
    store: Arc<dyn MessageStore>,
    notifier: Arc<dyn Notifier>,
    on_insert: OnInsert,
    state_tx: watch::Sender<SubscriptionState>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    let mut events = subscription.events;
    let mut status = subscription.status;

    apply_status(
        status.borrow_and_update().clone(),
        &state_tx,
        &notifier,
        conversation_id,
    );

    let mut status_open = true;
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            changed = status.changed(), if status_open => match changed {
                Ok(()) => apply_status(
                    status.borrow_and_update().clone(),
                    &state_tx,
                    &notifier,
                    conversation_id,
                ),
                Err(_) => status_open = false,
            },
            event = events.recv() => match event {
                Some(event) => match store.fetch_one(event.message_id).await {
                    Ok(message) => on_insert(message).await,
                    Err(e) => warn!(
                        %conversation_id,
                        message_id = %event.message_id,
                        error = %e,
                        "failed to hydrate live event, skipping"
                    ),
                },
                None => {
                    // Channel closed by the stream; surface any final
                    // status transition before leaving.
                    if status_open && status.has_changed().unwrap_or(false) {
                        apply_status(
                            status.borrow_and_update().clone(),
                            &state_tx,
                            &notifier,
                            conversation_id,
                        );
                    }
                    break;
                }
            },
        }
    }

    if closed.load(Ordering::SeqCst) {
        let _ = state_tx.send(SubscriptionState::Closed);
        debug!(%conversation_id, "live subscription worker stopped");
    }
}
