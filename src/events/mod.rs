pub mod redis;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::error::EventStreamError;

// Re-export key types for convenience
pub use self::redis::RedisEventStream;

/// Append notification observed on the live stream.
///
/// Carries identity only. Consumers re-fetch the full record through the
/// store; an inline payload is never trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendEvent {
    pub message_id: Uuid,
    pub conversation_id: Uuid,
}

/// Connection status of one live subscription. `Subscribed` is the single
/// nominal state; anything else is degraded service, not a hard error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Subscribing,
    Subscribed,
    Degraded(String),
}

/// One open subscription: append events arrive on `events`, connection
/// transitions on `status`. Dropping the event receiver tears the
/// subscription down.
pub struct EventSubscription {
    pub events: mpsc::Receiver<AppendEvent>,
    pub status: watch::Receiver<SubscriptionStatus>,
}

/// Per-conversation topic on the event stream.
pub fn conversation_topic(conversation_id: Uuid) -> String {
    format!("conversation:{conversation_id}")
}

/// Append-only event stream scoped by topic.
#[async_trait]
pub trait EventStream: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<EventSubscription, EventStreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_topic_format() {
        let id = Uuid::nil();
        assert_eq!(
            conversation_topic(id),
            "conversation:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_append_event_round_trips_as_json() {
        let event = AppendEvent {
            message_id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: AppendEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
