//! Backoff policy for polling a resource that has not yet reached a
//! terminal state (order/authorization status `pending`/`processing`),
//! honoring a server-supplied `Retry-After` hint when one is present.

use std::time::Duration;

/// Backoff strategy for a single poll loop.
#[derive(Debug, Clone)]
pub enum RetryStrategy {
    /// Exponential backoff: initial delay, cap, and growth factor.
    ExponentialBackoff {
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    },
    /// Linear backoff: initial delay plus a fixed increment per attempt.
    LinearBackoff {
        initial_delay: Duration,
        increment: Duration,
    },
    /// Always wait the same duration.
    FixedDelay(Duration),
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::ExponentialBackoff {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryStrategy {
    /// Delay before the `attempt`'th retry (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                multiplier,
            } => {
                let delay_ms = initial_delay.as_millis() as f64 * multiplier.powi(attempt as i32);
                Duration::from_millis(delay_ms as u64).min(*max_delay)
            }
            RetryStrategy::LinearBackoff {
                initial_delay,
                increment,
            } => initial_delay.saturating_add(increment.saturating_mul(attempt)),
            RetryStrategy::FixedDelay(delay) => *delay,
        }
    }
}

/// Bounds a poll loop: how many attempts, and what to wait between them.
/// A `Retry-After` header from the server always takes priority over the
/// computed strategy delay for that one iteration.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub strategy: RetryStrategy,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            strategy: RetryStrategy::default(),
        }
    }
}

impl PollPolicy {
    /// Delay to wait before the given attempt, preferring the server's
    /// `Retry-After` hint when it provided one.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| self.strategy.delay(attempt))
    }

    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_grows_and_caps() {
        let strategy = RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
        };
        assert!(strategy.delay(0) < strategy.delay(1));
        assert!(strategy.delay(1) < strategy.delay(2));
        assert!(strategy.delay(20) <= Duration::from_secs(1));
    }

    #[test]
    fn retry_after_overrides_the_strategy() {
        let policy = PollPolicy::default();
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn exhaustion_respects_max_attempts() {
        let policy = PollPolicy {
            max_attempts: 3,
            ..Default::default()
        };
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
    }
}
