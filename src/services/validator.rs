use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::error::ConversationError;
use crate::models::Conversation;
use crate::store::MessageStore;

/// Gatekeeper for mounting the messaging core on a conversation.
///
/// Degenerate conversations (fewer than two resolved participants) show up
/// occasionally from malformed join data; they are excluded and counted,
/// never escalated to a hard error on listing surfaces.
pub struct ConversationValidator {
    store: Arc<dyn MessageStore>,
    excluded: AtomicU64,
}

impl ConversationValidator {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self {
            store,
            excluded: AtomicU64::new(0),
        }
    }

    /// Load the conversation plus its participant list. Read-only; callers
    /// use the result to decide whether to mount the messaging core at all.
    pub async fn validate(&self, conversation_id: Uuid) -> Result<Conversation, ConversationError> {
        let conversation = self
            .store
            .fetch_conversation(conversation_id)
            .await?
            .ok_or(ConversationError::NotFound)?;

        if conversation.is_degenerate() {
            let participant_count = conversation.participants.len();
            self.excluded.fetch_add(1, Ordering::Relaxed);
            warn!(
                conversation_id = %conversation_id,
                participant_count,
                "conversation has too few participants, excluding"
            );
            return Err(ConversationError::Degenerate { participant_count });
        }

        Ok(conversation)
    }

    /// Conversations for a listing surface, degenerate rows filtered out.
    pub async fn list_valid(&self, user_id: Uuid) -> Result<Vec<Conversation>, ConversationError> {
        let conversations = self.store.list_conversations(user_id).await?;

        let mut valid = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            if conversation.is_degenerate() {
                self.excluded.fetch_add(1, Ordering::Relaxed);
                warn!(
                    conversation_id = %conversation.id,
                    participant_count = conversation.participants.len(),
                    "skipping degenerate conversation in listing"
                );
            } else {
                valid.push(conversation);
            }
        }

        Ok(valid)
    }

    /// Number of degenerate conversations filtered so far.
    pub fn excluded_count(&self) -> u64 {
        self.excluded.load(Ordering::Relaxed)
    }
}
