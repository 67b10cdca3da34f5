use std::sync::Arc;

use resilience::{with_retry, RetryConfig, RetryError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::connectivity::Connectivity;
use crate::error::{SendError, StoreError};
use crate::models::{NewMessage, OutgoingMessage};
use crate::notify::Notifier;
use crate::store::MessageStore;

/// Validates, persists, and retries an outgoing message.
///
/// Independent sends are not serialized against each other; each call owns
/// its own retry timeline. The pipeline never touches the local sequence,
/// a sent message becomes visible only through the live-update loop.
pub struct MessageSendPipeline {
    store: Arc<dyn MessageStore>,
    connectivity: Arc<dyn Connectivity>,
    notifier: Arc<dyn Notifier>,
    retry: RetryConfig,
}

impl MessageSendPipeline {
    pub fn new(
        store: Arc<dyn MessageStore>,
        connectivity: Arc<dyn Connectivity>,
        notifier: Arc<dyn Notifier>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            store,
            connectivity,
            notifier,
            retry,
        }
    }

    /// Append one message. Returns true on the attempt that succeeds;
    /// false on a local precondition failure, a non-retryable store
    /// failure, or retry exhaustion. Every terminal failure produces one
    /// notifier message carrying the cause; retries themselves are silent
    /// apart from log output.
    pub async fn send(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        payload: OutgoingMessage,
    ) -> bool {
        match self.try_send(conversation_id, sender_id, payload).await {
            Ok(message_id) => {
                debug!(%conversation_id, %message_id, "message appended");
                true
            }
            Err(e) => {
                self.notifier.error(&e.to_string());
                false
            }
        }
    }

    async fn try_send(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        payload: OutgoingMessage,
    ) -> Result<Uuid, SendError> {
        if !payload.is_sendable() {
            return Err(SendError::EmptyPayload);
        }
        if !self.connectivity.is_online() {
            return Err(SendError::Offline);
        }

        // One record, one id: stable across retries of this send.
        let record = NewMessage {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            content: payload.content,
            attachment_ref: payload.attachment_ref,
            attachment_metadata: payload.attachment_metadata,
        };

        let store = Arc::clone(&self.store);
        let result = with_retry(self.retry.clone(), StoreError::is_transient, move || {
            let store = Arc::clone(&store);
            let record = record.clone();
            async move { store.append(record).await }
        })
        .await;

        match result {
            Ok(message) => Ok(message.id),
            Err(error) => {
                if let RetryError::Exhausted { retries, .. } = &error {
                    warn!(%conversation_id, retries, "append retry budget exhausted");
                }
                Err(SendError::Store(error.into_inner()))
            }
        }
    }
}
