pub mod config;
pub mod connectivity;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod notify;
pub mod services;
pub mod store;

// Re-export key types for convenience
pub use services::view::{ConversationView, CoreState};
pub use resilience::RetryConfig;
