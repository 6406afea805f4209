use crate::utils::error::Result;
use crate::utils::validation;
use governor::{DefaultKeyedRateLimiter, Jitter, Quota};
use std::fmt;
use std::time::Duration;

/// Minimum spacing between calls sharing a label, plus random jitter.
///
/// Backed by a keyed GCRA limiter with a burst of one: the first call on a
/// label passes immediately, later calls wait out the interval. Jitter is only
/// added when a call actually has to wait.
pub struct RateLimiter {
    limiter: Option<DefaultKeyedRateLimiter<String>>,
    interval: Duration,
    jitter: Duration,
}

impl RateLimiter {
    /// Non-positive or non-finite intervals disable the limiter.
    pub fn new(interval_seconds: f64, jitter_seconds: f64) -> Result<Self> {
        if !interval_seconds.is_finite() || interval_seconds <= 0.0 {
            return Ok(Self::disabled());
        }

        let interval =
            validation::seconds_to_duration("rate_limit.interval_seconds", interval_seconds)?;
        let jitter = if jitter_seconds.is_finite() && jitter_seconds > 0.0 {
            validation::seconds_to_duration("rate_limit.jitter_seconds", jitter_seconds)?
        } else {
            Duration::ZERO
        };

        let limiter = Quota::with_period(interval).map(DefaultKeyedRateLimiter::<String>::keyed);
        Ok(Self {
            limiter,
            interval,
            jitter,
        })
    }

    pub fn disabled() -> Self {
        Self {
            limiter: None,
            interval: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    pub async fn wait(&self, label: &str) {
        let Some(limiter) = &self.limiter else {
            return;
        };

        let key = label.to_string();
        if limiter.check_key(&key).is_ok() {
            return;
        }
        tracing::trace!(label, interval_ms = self.interval.as_millis() as u64, "rate limit wait");
        limiter
            .until_key_ready_with_jitter(&key, Jitter::up_to(self.jitter))
            .await;
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("enabled", &self.is_enabled())
            .field("interval", &self.interval)
            .field("jitter", &self.jitter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EtlError;

    #[tokio::test]
    async fn test_consecutive_waits_are_spaced() {
        let limiter = RateLimiter::new(0.05, 0.0).unwrap();
        let start = std::time::Instant::now();

        for _ in 0..4 {
            limiter.wait("search").await;
        }

        assert!(start.elapsed() >= Duration::from_millis(145));
    }

    #[tokio::test]
    async fn test_jitter_only_adds_delay() {
        let limiter = RateLimiter::new(0.03, 0.02).unwrap();
        let start = std::time::Instant::now();

        for _ in 0..3 {
            limiter.wait("detail").await;
        }

        assert!(start.elapsed() >= Duration::from_millis(58));
    }

    #[tokio::test]
    async fn test_labels_are_independent() {
        let limiter = RateLimiter::new(5.0, 0.0).unwrap();
        let start = std::time::Instant::now();

        limiter.wait("search").await;
        limiter.wait("detail").await;

        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_non_positive_interval_is_noop() {
        for interval in [0.0, -2.0, f64::NAN] {
            let limiter = RateLimiter::new(interval, 1.0).unwrap();
            assert!(!limiter.is_enabled());

            let start = std::time::Instant::now();
            for _ in 0..10 {
                limiter.wait("search").await;
            }
            assert!(start.elapsed() < Duration::from_millis(500));
        }
    }

    #[test]
    fn test_huge_interval_is_an_error_not_a_panic() {
        assert!(matches!(
            RateLimiter::new(1e20, 0.0),
            Err(EtlError::InvalidConfigValueError { .. })
        ));
        assert!(matches!(
            RateLimiter::new(1.0, 1e20),
            Err(EtlError::InvalidConfigValueError { .. })
        ));
    }
}
