//! Runtime configuration

use std::time::Duration;

/// Configuration shared by every thread of a runtime.
///
/// Controls how container guards are acquired and checked.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Assert that each traversal acquires guards strictly root-to-leaf.
    /// A violation panics on the spot instead of deadlocking later.
    pub lock_order_checks: bool,

    /// Give up on a guard after this long and raise `THREAD-DEADLOCK`.
    /// `None` blocks indefinitely.
    pub lock_timeout: Option<Duration>,

    /// Emit a `trace` event for every guard acquired and released.
    pub trace_locks: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            lock_order_checks: cfg!(debug_assertions),
            lock_timeout: None,
            trace_locks: false,
        }
    }
}

impl RuntimeConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration that bounds every guard acquisition.
    pub fn with_lock_timeout(timeout: Duration) -> Self {
        Self {
            lock_timeout: Some(timeout),
            ..Default::default()
        }
    }

    /// Enable or disable the root-to-leaf ordering assertion.
    pub fn lock_order_checks(mut self, enabled: bool) -> Self {
        self.lock_order_checks = enabled;
        self
    }

    /// Enable or disable per-guard trace events.
    pub fn trace_locks(mut self, enabled: bool) -> Self {
        self.trace_locks = enabled;
        self
    }
}
