//! Postgres-backed message store
//!
//! Queries target the platform schema: `messages`, `conversations`,
//! `conversation_members`, and the `users` table owned by the identity
//! service (read-only here, sender summaries only).

use std::collections::HashMap;

use async_trait::async_trait;
use deadpool_postgres::{Client, Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

use crate::config::Config;
use crate::error::StoreError;
use crate::events::redis::RedisEventStream;
use crate::events::AppendEvent;
use crate::models::{Conversation, Message, NewMessage, Participant, SenderSummary};
use crate::store::MessageStore;

/// Create a connection pool for the store.
pub fn create_pool(database_url: &str) -> Result<Pool, StoreError> {
    let pg_config = database_url
        .parse::<tokio_postgres::Config>()
        .map_err(|e| StoreError::new(format!("invalid DATABASE_URL: {e}")))?;

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Pool::builder(manager)
        .max_size(16)
        .build()
        .map_err(|e| StoreError::new(format!("pool build: {e}")))
}

pub struct PgMessageStore {
    pool: Pool,
    history_limit: i64,
    fanout: Option<RedisEventStream>,
}

impl PgMessageStore {
    pub fn new(pool: Pool, config: &Config) -> Self {
        Self {
            pool,
            history_limit: config.history_fetch_limit,
            fanout: None,
        }
    }

    /// Fan out an append event after every successful insert so live
    /// subscribers observe the new row.
    pub fn with_fanout(mut self, fanout: RedisEventStream) -> Self {
        self.fanout = Some(fanout);
        self
    }

    fn message_from_row(row: &Row, with_sender: bool) -> Message {
        Message {
            id: row.get("id"),
            conversation_id: row.get("conversation_id"),
            sender_id: row.get("sender_id"),
            content: row.get("content"),
            attachment_ref: row.get("attachment_ref"),
            attachment_metadata: row.get("attachment_metadata"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            sender: with_sender.then(|| SenderSummary {
                id: row.get("sender_id"),
                display_name: row.get("display_name"),
                avatar_ref: row.get("avatar_ref"),
            }),
        }
    }

    async fn participants_by_conversation(
        client: &Client,
        conversation_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, Vec<Participant>>, StoreError> {
        if conversation_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = client
            .query(
                r#"
                SELECT cm.conversation_id, cm.user_id, u.display_name, u.avatar_ref
                FROM conversation_members cm
                JOIN users u ON u.id = cm.user_id
                WHERE cm.conversation_id = ANY($1)
                ORDER BY cm.user_id
                "#,
                &[&conversation_ids],
            )
            .await?;

        let mut by_conversation: HashMap<Uuid, Vec<Participant>> = HashMap::new();
        for row in rows {
            let conversation_id: Uuid = row.get("conversation_id");
            let user_id: Uuid = row.get("user_id");
            by_conversation
                .entry(conversation_id)
                .or_default()
                .push(Participant {
                    user_id,
                    profile: SenderSummary {
                        id: user_id,
                        display_name: row.get("display_name"),
                        avatar_ref: row.get("avatar_ref"),
                    },
                });
        }

        Ok(by_conversation)
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn append(&self, record: NewMessage) -> Result<Message, StoreError> {
        let client = self.pool.get().await?;

        let row = client
            .query_one(
                r#"
                INSERT INTO messages (id, conversation_id, sender_id, content, attachment_ref, attachment_metadata)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, conversation_id, sender_id, content, attachment_ref, attachment_metadata, created_at, updated_at
                "#,
                &[
                    &record.id,
                    &record.conversation_id,
                    &record.sender_id,
                    &record.content,
                    &record.attachment_ref,
                    &record.attachment_metadata,
                ],
            )
            .await?;

        let message = Self::message_from_row(&row, false);

        if let Some(fanout) = &self.fanout {
            let event = AppendEvent {
                message_id: message.id,
                conversation_id: message.conversation_id,
            };
            if let Err(e) = fanout.publish_append(&event).await {
                tracing::warn!(message_id = %message.id, error = %e, "append fanout failed");
            }
        }

        Ok(message)
    }

    async fn fetch_ordered(&self, conversation_id: Uuid) -> Result<Vec<Message>, StoreError> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                r#"
                SELECT m.id, m.conversation_id, m.sender_id, m.content,
                       m.attachment_ref, m.attachment_metadata,
                       m.created_at, m.updated_at,
                       u.display_name, u.avatar_ref
                FROM messages m
                JOIN users u ON u.id = m.sender_id
                WHERE m.conversation_id = $1
                ORDER BY m.created_at ASC, m.id ASC
                LIMIT $2
                "#,
                &[&conversation_id, &self.history_limit],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| Self::message_from_row(row, true))
            .collect())
    }

    async fn fetch_one(&self, id: Uuid) -> Result<Message, StoreError> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                r#"
                SELECT m.id, m.conversation_id, m.sender_id, m.content,
                       m.attachment_ref, m.attachment_metadata,
                       m.created_at, m.updated_at,
                       u.display_name, u.avatar_ref
                FROM messages m
                JOIN users u ON u.id = m.sender_id
                WHERE m.id = $1
                "#,
                &[&id],
            )
            .await?
            .ok_or_else(|| StoreError::new(format!("message {id} not found")))?;

        Ok(Self::message_from_row(&row, true))
    }

    async fn fetch_conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, name, is_group FROM conversations WHERE id = $1",
                &[&id],
            )
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let participants = Self::participants_by_conversation(&client, vec![id])
            .await?
            .remove(&id)
            .unwrap_or_default();

        Ok(Some(Conversation {
            id: row.get("id"),
            name: row.get("name"),
            is_group: row.get("is_group"),
            participants,
        }))
    }

    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>, StoreError> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                r#"
                SELECT c.id, c.name, c.is_group
                FROM conversations c
                JOIN conversation_members cm ON cm.conversation_id = c.id
                WHERE cm.user_id = $1
                ORDER BY c.created_at DESC
                LIMIT 100
                "#,
                &[&user_id],
            )
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.get("id")).collect();
        let mut participants = Self::participants_by_conversation(&client, ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                Conversation {
                    id,
                    name: row.get("name"),
                    is_group: row.get("is_group"),
                    participants: participants.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }
}
