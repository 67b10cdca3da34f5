pub mod live_updates;
pub mod send_pipeline;
pub mod sequence;
pub mod validator;
pub mod view;

// Re-export key types for convenience
pub use live_updates::{LiveHandle, LiveUpdateSubscriber, SubscriptionState};
pub use send_pipeline::MessageSendPipeline;
pub use sequence::{ConversationMessageSequence, SequenceSnapshot};
pub use validator::ConversationValidator;
pub use view::{ConversationView, CoreState};
