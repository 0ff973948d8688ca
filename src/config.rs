use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 30_000;

/// Coalescer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoalescerConfig {
    /// How long an idle coalescer waits for the next event before it stops.
    pub idle_timeout_ms: u64,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

impl CoalescerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Idle timeout, floored at one millisecond.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms.max(1))
    }
}
