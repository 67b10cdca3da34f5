use std::sync::Arc;

use resilience::RetryConfig;
use tracing::warn;
use uuid::Uuid;

use crate::connectivity::Connectivity;
use crate::error::ConversationError;
use crate::events::EventStream;
use crate::models::{Conversation, OutgoingMessage};
use crate::notify::Notifier;
use crate::services::live_updates::{LiveHandle, LiveUpdateSubscriber, OnInsert, SubscriptionState};
use crate::services::send_pipeline::MessageSendPipeline;
use crate::services::sequence::{ConversationMessageSequence, SequenceSnapshot};
use crate::services::validator::ConversationValidator;
use crate::store::MessageStore;

/// Shared capabilities handed to every conversation view.
#[derive(Clone)]
pub struct CoreState {
    pub store: Arc<dyn MessageStore>,
    pub events: Arc<dyn EventStream>,
    pub connectivity: Arc<dyn Connectivity>,
    pub notifier: Arc<dyn Notifier>,
    pub retry: RetryConfig,
}

/// One open conversation view: exactly one fetch+subscribe pair, owned
/// here. The send path writes to the store only; new rows enter the
/// sequence through the live-update loop.
pub struct ConversationView {
    conversation: Conversation,
    sequence: Arc<ConversationMessageSequence>,
    pipeline: MessageSendPipeline,
    store: Arc<dyn MessageStore>,
    live: Option<LiveHandle>,
    closed: bool,
}

impl ConversationView {
    /// Validate the conversation and mount the messaging core on it.
    ///
    /// The live subscription is attached before the initial fetch runs;
    /// the two complete independently, and merge-by-identity makes their
    /// relative order immaterial. A failed subscription degrades the view
    /// to fetch-only rather than refusing the mount.
    pub async fn open(
        state: &CoreState,
        validator: &ConversationValidator,
        conversation_id: Uuid,
    ) -> Result<Self, ConversationError> {
        let conversation = validator.validate(conversation_id).await?;

        let sequence = Arc::new(ConversationMessageSequence::new(conversation_id));
        let subscriber = LiveUpdateSubscriber::new(
            Arc::clone(&state.store),
            Arc::clone(&state.events),
            Arc::clone(&state.notifier),
        );

        let on_insert: OnInsert = {
            let sequence = Arc::clone(&sequence);
            Arc::new(move |message| {
                let sequence = Arc::clone(&sequence);
                Box::pin(async move {
                    sequence.merge(message).await;
                })
            })
        };

        let live = match subscriber.subscribe(conversation_id, on_insert).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(%conversation_id, error = %e, "live subscription unavailable, fetch-only view");
                state
                    .notifier
                    .warn(&format!("Live updates are unavailable for this conversation ({e})"));
                None
            }
        };

        let view = Self {
            conversation,
            sequence,
            pipeline: MessageSendPipeline::new(
                Arc::clone(&state.store),
                Arc::clone(&state.connectivity),
                Arc::clone(&state.notifier),
                state.retry.clone(),
            ),
            store: Arc::clone(&state.store),
            live,
            closed: false,
        };

        // Seed the sequence; a load failure is held as view state for a
        // manual retry, not escalated out of the mount.
        if let Err(e) = view.sequence.load(view.store.as_ref()).await {
            warn!(%conversation_id, error = %e, "initial history fetch failed");
        }

        Ok(view)
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Re-run the ordered fetch (manual retry after a load failure, or a
    /// refresh while the subscription is degraded).
    pub async fn refresh(&self) -> SequenceSnapshot {
        if let Err(e) = self.sequence.load(self.store.as_ref()).await {
            warn!(
                conversation_id = %self.sequence.conversation_id(),
                error = %e,
                "history refresh failed"
            );
        }
        self.sequence.snapshot().await
    }

    pub async fn snapshot(&self) -> SequenceSnapshot {
        self.sequence.snapshot().await
    }

    /// Append through the send pipeline; the result becomes visible in the
    /// sequence only via the live-update loop.
    pub async fn send(&self, sender_id: Uuid, payload: OutgoingMessage) -> bool {
        self.pipeline
            .send(self.conversation.id, sender_id, payload)
            .await
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        if self.closed {
            return SubscriptionState::Closed;
        }
        match &self.live {
            Some(handle) => handle.state(),
            None => SubscriptionState::Degraded,
        }
    }

    /// Release the live subscription. Idempotent. An in-flight send retry
    /// timeline is not cancelled by teardown (see DESIGN.md).
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(live) = self.live.take() {
            live.close();
        }
    }
}

impl Drop for ConversationView {
    fn drop(&mut self) {
        self.close();
    }
}
