//! Bounded exponential-backoff retry for collaborator calls.
//!
//! Every network call the orchestrator makes goes through
//! [`execute_with_retry`]. The error type decides, via [`Transient`],
//! whether another attempt is worthwhile.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// Errors that can tell whether retrying them might succeed.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Retry budget for one call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of tries, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each time after that.
    pub base_delay: Duration,
    /// Upper bound of the uniform random jitter added to every delay.
    pub jitter_ceiling: Duration,
}

impl RetryPolicy {
    /// Budget for playlist/track status writes.
    pub const fn persistence() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            jitter_ceiling: Duration::from_millis(500),
        }
    }

    /// Budget for audio generation. Each attempt is expensive, so only one
    /// retry is allowed.
    pub const fn audio() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(1000),
            jitter_ceiling: Duration::from_millis(500),
        }
    }

    /// Policy that never sleeps. Useful for tests.
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            jitter_ceiling: Duration::ZERO,
        }
    }

    /// Deterministic part of the delay after the given zero-based attempt:
    /// `base_delay * 2^attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    fn jitter(&self) -> Duration {
        let ceiling_ms = self.jitter_ceiling.as_millis() as u64;
        if ceiling_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=ceiling_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::persistence()
    }
}

/// Run `op` until it succeeds, fails with a non-transient error, or the
/// policy's attempt budget is spent.
///
/// `op` is invoked at most `policy.max_attempts` times (at least once).
/// The last error is returned unchanged.
pub async fn execute_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        attempt += 1;
        if attempt >= max_attempts || !err.is_transient() {
            return Err(err);
        }

        let delay = policy.backoff_delay(attempt - 1) + policy.jitter();
        tracing::warn!(
            label,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Transient failure, retrying",
        );
        tokio::time::sleep(delay).await;
    }
}
