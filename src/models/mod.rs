pub mod conversation;
pub mod message;

// Re-export key types for convenience
pub use conversation::{Conversation, Participant};
pub use message::{Message, NewMessage, OutgoingMessage, SenderSummary};
