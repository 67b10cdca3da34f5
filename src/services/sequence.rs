use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::LoadError;
use crate::models::Message;
use crate::store::MessageStore;

/// Point-in-time copy of the merged view handed to the caller.
#[derive(Debug, Clone)]
pub struct SequenceSnapshot {
    pub messages: Vec<Message>,
    pub loading: bool,
    pub error: Option<LoadError>,
}

#[derive(Default)]
struct SequenceInner {
    messages: Vec<Message>,
    loading: bool,
    error: Option<LoadError>,
}

/// Merged, ordered, duplicate-free message sequence for one conversation.
///
/// Seeded by the ordered fetch; live updates land through `merge`. Both
/// producers carry store-assigned timestamps, and every insert lands at
/// its `(created_at, id)` position, so arrival order never affects
/// display order.
pub struct ConversationMessageSequence {
    conversation_id: Uuid,
    inner: RwLock<SequenceInner>,
}

impl ConversationMessageSequence {
    pub fn new(conversation_id: Uuid) -> Self {
        Self {
            conversation_id,
            inner: RwLock::new(SequenceInner::default()),
        }
    }

    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }

    /// Seed (or re-seed) from the ordered fetch. Fetched rows merge by
    /// identity, so a live event that raced ahead of the fetch stays
    /// deduplicated. On failure the previous contents stay in place and
    /// the error is held as state for a manual-retry affordance.
    pub async fn load(&self, store: &dyn MessageStore) -> Result<usize, LoadError> {
        self.inner.write().await.loading = true;

        match store.fetch_ordered(self.conversation_id).await {
            Ok(messages) => {
                let mut inner = self.inner.write().await;
                for message in messages {
                    Self::insert_if_absent(&mut inner.messages, message);
                }
                inner.loading = false;
                inner.error = None;
                Ok(inner.messages.len())
            }
            Err(e) => {
                let error = LoadError(e);
                let mut inner = self.inner.write().await;
                inner.loading = false;
                inner.error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Insert-if-absent by id. Returns false when the id was already
    /// present (duplicate delivery from subscription replay or the
    /// fetch/subscribe overlap window).
    pub async fn merge(&self, message: Message) -> bool {
        let mut inner = self.inner.write().await;
        Self::insert_if_absent(&mut inner.messages, message)
    }

    pub async fn snapshot(&self) -> SequenceSnapshot {
        let inner = self.inner.read().await;
        SequenceSnapshot {
            messages: inner.messages.clone(),
            loading: inner.loading,
            error: inner.error.clone(),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.messages.is_empty()
    }

    // Store timestamps are assumed monotonic per conversation but that is
    // not contractual; a position search keeps the (created_at, id)
    // invariant even for skewed arrivals, at no cost in the in-order case.
    fn insert_if_absent(messages: &mut Vec<Message>, message: Message) -> bool {
        if messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        let key = message.ordering_key();
        let at = messages.partition_point(|m| m.ordering_key() <= key);
        messages.insert(at, message);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn message_at(conversation_id: Uuid, secs: i64) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id: Uuid::new_v4(),
            content: Some(format!("m@{secs}")),
            attachment_ref: None,
            attachment_metadata: None,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            updated_at: None,
            sender: None,
        }
    }

    #[tokio::test]
    async fn test_merge_is_idempotent_by_id() {
        let conversation_id = Uuid::new_v4();
        let sequence = ConversationMessageSequence::new(conversation_id);
        let message = message_at(conversation_id, 10);

        assert!(sequence.merge(message.clone()).await);
        assert!(!sequence.merge(message).await);
        assert_eq!(sequence.len().await, 1);
    }

    #[tokio::test]
    async fn test_out_of_order_arrival_is_reordered() {
        let conversation_id = Uuid::new_v4();
        let sequence = ConversationMessageSequence::new(conversation_id);
        let m1 = message_at(conversation_id, 10);
        let m2 = message_at(conversation_id, 20);

        // Live update for the newer row lands first.
        sequence.merge(m2.clone()).await;
        sequence.merge(m1.clone()).await;

        let snapshot = sequence.snapshot().await;
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.messages[0].id, m1.id);
        assert_eq!(snapshot.messages[1].id, m2.id);
    }

    #[tokio::test]
    async fn test_equal_timestamps_tie_break_on_id() {
        let conversation_id = Uuid::new_v4();
        let sequence = ConversationMessageSequence::new(conversation_id);
        let mut a = message_at(conversation_id, 10);
        let mut b = message_at(conversation_id, 10);
        a.id = Uuid::from_u128(1);
        b.id = Uuid::from_u128(2);

        sequence.merge(b.clone()).await;
        sequence.merge(a.clone()).await;

        let snapshot = sequence.snapshot().await;
        assert_eq!(snapshot.messages[0].id, a.id);
        assert_eq!(snapshot.messages[1].id, b.id);
    }
}
