//! Exponential-backoff retry around any [`Notifier`].
//!
//! Alert notifications are advisory, so the default attempt count is one
//! (no retry). Deployments that want more set `NOTIFY_ATTEMPTS`; the
//! pipeline's per-call timeout still bounds the whole retry loop.

use std::time::Duration;

use async_trait::async_trait;
use greendelivery_core::sink::{Notifier, NotifyError};

/// Delay before the second attempt; doubles for each attempt after that.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

pub struct RetryNotifier<N> {
    inner: N,
    attempts: u32,
    base_delay: Duration,
}

impl<N: Notifier> RetryNotifier<N> {
    /// Wrap `inner`, trying at most `attempts` times (minimum one).
    pub fn new(inner: N, attempts: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            base_delay,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[async_trait]
impl<N: Notifier> Notifier for RetryNotifier<N> {
    async fn notify(&self, summary: &str) -> Result<(), NotifyError> {
        let mut delay = self.base_delay;
        let mut attempt = 1;
        loop {
            match self.inner.notify(summary).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= self.attempts => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.attempts,
                        error = %e,
                        "Notification attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Fails the first `failures` calls, then succeeds.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Notifier for Flaky {
        async fn notify(&self, _summary: &str) -> Result<(), NotifyError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(NotifyError::HttpStatus(503))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn single_attempt_does_not_retry() {
        let notifier = RetryNotifier::new(Flaky::new(1), 1, Duration::ZERO);
        assert!(notifier.notify("x").await.is_err());
        assert_eq!(notifier.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let notifier = RetryNotifier::new(Flaky::new(2), 3, Duration::from_millis(1));
        assert!(notifier.notify("x").await.is_ok());
        assert_eq!(notifier.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let notifier = RetryNotifier::new(Flaky::new(10), 3, Duration::from_millis(1));
        assert_eq!(
            notifier.notify("x").await,
            Err(NotifyError::HttpStatus(503))
        );
        assert_eq!(notifier.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let notifier = RetryNotifier::new(Flaky::new(0), 0, Duration::ZERO);
        assert_eq!(notifier.attempts(), 1);
    }
}
