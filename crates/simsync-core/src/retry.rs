use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// How often to repeat a reconciliation after a bridge failure.
///
/// Only [`CoreError::is_retryable`] errors are retried. Callers resolve the
/// device and validate the app once, outside the retried operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    pub interval_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            interval_ms: 2000,
        }
    }
}

impl RetryPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Call `op` with the 1-based attempt number until it succeeds, fails with
    /// a non-retryable error, or the attempts run out.
    pub fn run<T>(
        &self,
        mut op: impl FnMut(u32) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        "attempt {attempt}/{attempts} failed: {e}; retrying in {}ms",
                        self.interval_ms
                    );
                    std::thread::sleep(self.interval());
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
