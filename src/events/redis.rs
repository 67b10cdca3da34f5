//! Redis pub/sub event stream
//!
//! Appends are fanned out as JSON payloads on a per-conversation channel.
//! Each subscription owns one dedicated pub/sub connection and a pump task
//! that forwards decoded events; publishing shares a managed connection.

use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::{mpsc, watch};

use crate::error::EventStreamError;
use crate::events::{AppendEvent, EventStream, EventSubscription, SubscriptionStatus};

/// Channel naming convention, shared by publisher and subscribers.
fn channel_key(topic: &str) -> String {
    format!("chat:{topic}:messages")
}

#[derive(Clone)]
pub struct RedisEventStream {
    client: Client,
    manager: ConnectionManager,
}

impl RedisEventStream {
    pub async fn connect(url: &str) -> Result<Self, EventStreamError> {
        let client = Client::open(url)?;
        let manager = ConnectionManager::new(client.clone()).await?;
        Ok(Self { client, manager })
    }

    /// Fan out one append to live subscribers of its conversation.
    pub async fn publish_append(&self, event: &AppendEvent) -> Result<(), EventStreamError> {
        let payload = serde_json::to_string(event)
            .map_err(|e| EventStreamError::Connection(format!("serialize append event: {e}")))?;
        let channel = channel_key(&super::conversation_topic(event.conversation_id));

        let mut conn = self.manager.clone();
        let _: () = conn.publish(channel, payload).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventStream for RedisEventStream {
    async fn subscribe(&self, topic: &str) -> Result<EventSubscription, EventStreamError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| EventStreamError::Subscribe(e.to_string()))?;

        let channel = channel_key(topic);
        let (event_tx, event_rx) = mpsc::channel(64);
        let (status_tx, status_rx) = watch::channel(SubscriptionStatus::Subscribing);

        if let Err(e) = pubsub.subscribe(&channel).await {
            // Degraded, not fatal: the caller keeps its fetch-only view.
            tracing::warn!(channel = %channel, error = %e, "pubsub subscribe failed");
            let _ = status_tx.send(SubscriptionStatus::Degraded(e.to_string()));
            return Ok(EventSubscription {
                events: event_rx,
                status: status_rx,
            });
        }

        let _ = status_tx.send(SubscriptionStatus::Subscribed);

        tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(error = %e, "undecodable pubsub payload, skipping");
                        continue;
                    }
                };
                match serde_json::from_str::<AppendEvent>(&payload) {
                    Ok(event) => {
                        if event_tx.send(event).await.is_err() {
                            // Receiver gone: the view closed, stop pumping.
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "malformed append event payload, skipping");
                    }
                }
            }
            // Stream ended underneath us: connection lost.
            let _ = status_tx.send(SubscriptionStatus::Degraded(
                "pubsub connection closed".to_string(),
            ));
        });

        Ok(EventSubscription {
            events: event_rx,
            status: status_rx,
        })
    }
}
