use thiserror::Error;

/// Distinguishes between retryable and permanent failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Retryable,
    Permanent,
}

/// Postgres SqlState for a statement cancelled by `statement_timeout`.
pub const STATEMENT_TIMEOUT: &str = "57014";

/// Failure reported by the message store collaborator.
#[derive(Debug, Clone, Error)]
#[error("store error: {message}")]
pub struct StoreError {
    /// Backend error code (Postgres SqlState) when the backend supplied one.
    pub code: Option<String>,
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Timeout-class failures are worth another attempt; everything else
    /// (permission, schema, unknown) is terminal on first occurrence.
    pub fn is_transient(&self) -> bool {
        if self.code.as_deref() == Some(STATEMENT_TIMEOUT) {
            return true;
        }
        let message = self.message.to_ascii_lowercase();
        message.contains("timeout") || message.contains("timed out")
    }

    pub fn kind(&self) -> ErrorKind {
        if self.is_transient() {
            ErrorKind::Retryable
        } else {
            ErrorKind::Permanent
        }
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        Self {
            code: e.code().map(|c| c.code().to_string()),
            message: e.to_string(),
        }
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        match e {
            deadpool_postgres::PoolError::Timeout(_) => Self::new(format!("pool timeout: {e}")),
            other => Self::new(format!("pool: {other}")),
        }
    }
}

/// Terminal outcome of one send call. Local preconditions fail before any
/// store call is issued; store failures arrive here only after retries are
/// spent or the failure is classified permanent.
#[derive(Debug, Clone, Error)]
pub enum SendError {
    #[error("message is empty: text or an attachment is required")]
    EmptyPayload,

    #[error("cannot send while offline, check your connection and try again")]
    Offline,

    #[error("message send failed: {0}")]
    Store(StoreError),
}

/// Outcome of resolving a conversation before mounting the messaging core.
#[derive(Debug, Clone, Error)]
pub enum ConversationError {
    #[error("conversation not found")]
    NotFound,

    #[error("conversation has {participant_count} participant(s), at least 2 required")]
    Degenerate { participant_count: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Initial or manual history fetch failure. Held as view state alongside
/// the stale/empty sequence; never auto-retried.
#[derive(Debug, Clone, Error)]
#[error("failed to load conversation history: {0}")]
pub struct LoadError(pub StoreError);

#[derive(Debug, Clone, Error)]
pub enum EventStreamError {
    #[error("subscribe failed: {0}")]
    Subscribe(String),

    #[error("event stream connection error: {0}")]
    Connection(String),
}

impl From<redis::RedisError> for EventStreamError {
    fn from(e: redis::RedisError) -> Self {
        EventStreamError::Connection(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_timeout_code_is_transient() {
        let err = StoreError::with_code(STATEMENT_TIMEOUT, "canceling statement due to statement timeout");
        assert!(err.is_transient());
        assert_eq!(err.kind(), ErrorKind::Retryable);
    }

    #[test]
    fn timeout_message_is_transient() {
        assert!(StoreError::new("pool timeout: no connection available").is_transient());
        assert!(StoreError::new("connection timed out").is_transient());
    }

    #[test]
    fn permission_and_schema_errors_are_permanent() {
        let permission = StoreError::with_code("42501", "permission denied for table messages");
        assert!(!permission.is_transient());
        assert_eq!(permission.kind(), ErrorKind::Permanent);

        let schema = StoreError::with_code("42703", "column \"contents\" does not exist");
        assert!(!schema.is_transient());
    }
}
