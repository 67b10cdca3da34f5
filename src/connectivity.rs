use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Externally maintained connectivity signal, polled at send time.
///
/// The core never probes the network itself; the surrounding application
/// owns the monitor and flips the flag.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Shared boolean flag driven by the host application's network monitor.
#[derive(Clone)]
pub struct ConnectivityFlag {
    inner: Arc<AtomicBool>,
}

impl ConnectivityFlag {
    pub fn new(online: bool) -> Self {
        Self {
            inner: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.inner.store(online, Ordering::Relaxed);
    }
}

impl Default for ConnectivityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for ConnectivityFlag {
    fn is_online(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}
