//! Lock manager configuration loaded from environment variables.

use std::time::Duration;

/// Lock acquisition configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `LOCK_ACQUIRE_TIMEOUT_MS`: how long a caller may wait for a
///   contended key before failing (default: `3000`)
#[derive(Debug, Clone, Copy)]
pub struct LockConfig {
    pub acquire_timeout: Duration,
}

impl LockConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let acquire_timeout = std::env::var("LOCK_ACQUIRE_TIMEOUT_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| Self::default().acquire_timeout);

        Self { acquire_timeout }
    }

    /// Overrides the acquisition timeout.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            acquire_timeout: Duration::from_secs(3),
        }
    }
}
