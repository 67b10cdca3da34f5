/// Resilience helpers for collaborator calls
///
/// Currently provides a single pattern:
/// - **Retry**: classifier-driven retry with a fixed delay between attempts,
///   for failures that are worth a second try (timeouts and friends)
///
/// # Example
///
/// ```rust,no_run
/// use resilience::{with_retry, RetryConfig};
///
/// async fn append_with_retry() {
///     let result = with_retry(RetryConfig::default(), |e: &String| e.contains("timeout"), || async {
///         // Your store call here
///         Ok::<_, String>(())
///     })
///     .await;
///     let _ = result;
/// }
/// ```
pub mod retry;

// Re-export main types for convenience
pub use retry::{with_retry, RetryConfig, RetryError};
