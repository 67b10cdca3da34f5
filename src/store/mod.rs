pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Conversation, Message, NewMessage};

// Re-export key types for convenience
pub use postgres::{create_pool, PgMessageStore};

/// Transactional backing store for conversations and messages.
///
/// The store assigns `created_at` on append and is the sole ordering
/// authority. Single-row inserts only; this core never opens multi-row
/// transactions against it.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append one message and return the persisted row.
    async fn append(&self, record: NewMessage) -> Result<Message, StoreError>;

    /// Full ordered history for a conversation (ascending `created_at`,
    /// ties broken by `id`), sender summary joined.
    async fn fetch_ordered(&self, conversation_id: Uuid) -> Result<Vec<Message>, StoreError>;

    /// Single message by id, sender summary joined.
    async fn fetch_one(&self, id: Uuid) -> Result<Message, StoreError>;

    /// Conversation header plus participant list; `None` when no row exists.
    async fn fetch_conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError>;

    /// Conversations the user belongs to, unfiltered. Degenerate rows are
    /// the validator's concern, not the store's.
    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>, StoreError>;
}
