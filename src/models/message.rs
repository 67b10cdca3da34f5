use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Sender profile fields joined onto every fetched message.
///
/// Typed projection of the upstream join; the core reads profile data from
/// nowhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderSummary {
    pub id: Uuid,
    pub display_name: String,
    pub avatar_ref: Option<String>,
}

/// Message row as returned by the store.
///
/// A message carries text, an attachment reference, or both, never neither.
/// `created_at` is store-assigned and is the sole ordering authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub attachment_ref: Option<String>,
    pub attachment_metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    /// Reserved for edit support; never set by this core.
    pub updated_at: Option<DateTime<Utc>>,
    /// Present on fetch paths; append returns the bare row.
    pub sender: Option<SenderSummary>,
}

impl Message {
    /// Canonical ordering key: ascending `created_at`, ties broken by `id`.
    pub fn ordering_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }
}

/// Record handed to the store for a single append. The id is generated
/// client-side and stays stable across retries of the same send.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub attachment_ref: Option<String>,
    pub attachment_metadata: Option<JsonValue>,
}

/// Outgoing payload accepted by the send pipeline.
#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub attachment_ref: Option<String>,
    pub attachment_metadata: Option<JsonValue>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn attachment(attachment_ref: impl Into<String>, metadata: Option<JsonValue>) -> Self {
        Self {
            content: None,
            attachment_ref: Some(attachment_ref.into()),
            attachment_metadata: metadata,
        }
    }

    /// A payload must carry nonempty trimmed text or an attachment
    /// reference to be worth a store call.
    pub fn is_sendable(&self) -> bool {
        self.content
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false)
            || self.attachment_ref.is_some()
    }
}
