use tracing::{error, warn};

/// User-facing notification capability injected by the host application.
///
/// Terminal send failures and degraded-service transitions each produce one
/// discrete human-readable message through this seam; the core never talks
/// to a UI runtime directly.
pub trait Notifier: Send + Sync {
    /// Non-fatal condition the user should see (degraded service).
    fn warn(&self, message: &str);
    /// Terminal failure, message carries the underlying cause.
    fn error(&self, message: &str);
}

/// Default notifier: routes through the tracing pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn warn(&self, message: &str) {
        warn!("{message}");
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }
}
