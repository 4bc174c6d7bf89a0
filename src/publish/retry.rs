//! Retry decorator for publishers.
//!
//! [`Retry`] wraps any [`Publisher`] and re-sends a digest when the failure
//! looks transient (see [`PublishError::is_retryable`]).
//!
//! # Backoff Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=jitter)
//! ```

use super::{Dialect, Publisher};
use crate::error::PublishError;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

pub struct Retry<P> {
    inner: P,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: Duration,
    max_delay: Duration,
    jitter: Duration,
}

impl<P: Publisher> Retry<P> {
    pub fn new(inner: P, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            jitter: Duration::from_millis(250),
        }
    }

    /// Upper bound of the random delay added to every backoff.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms = self.jitter.as_millis() as u64;
        delay + Duration::from_millis(rng().random_range(0..=jitter_ms))
    }
}

impl<P> fmt::Debug for Retry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<P: Publisher> Publisher for Retry<P> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    #[instrument(level = "info", skip_all, fields(destination = self.inner.name()))]
    async fn publish(&self, title: &str, content: &str) -> Result<(), PublishError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.publish(title, content).await {
                Ok(()) => {
                    if attempt > 0 {
                        info!(attempt, "Publish succeeded after retrying");
                    }
                    return Ok(());
                }
                Err(e) if !e.is_retryable() => {
                    error!(error = %e, "Publish failed with a permanent error");
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "Publish exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Publish failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Fails with each queued status in turn, then succeeds.
    struct Flaky {
        failures: RefCell<Vec<u16>>,
        calls: RefCell<usize>,
    }

    impl Flaky {
        fn new(mut statuses: Vec<u16>) -> Self {
            statuses.reverse();
            Self {
                failures: RefCell::new(statuses),
                calls: RefCell::new(0),
            }
        }
    }

    impl Publisher for Flaky {
        fn name(&self) -> &'static str {
            "Flaky"
        }

        fn dialect(&self) -> Dialect {
            Dialect::Markdown
        }

        async fn publish(&self, _title: &str, _content: &str) -> Result<(), PublishError> {
            *self.calls.borrow_mut() += 1;
            match self.failures.borrow_mut().pop() {
                Some(status) => Err(PublishError::Status {
                    destination: "Flaky",
                    status,
                    body: String::new(),
                }),
                None => Ok(()),
            }
        }
    }

    fn retry(inner: Flaky, max_retries: usize) -> Retry<Flaky> {
        Retry::new(inner, max_retries, Duration::from_millis(1)).with_jitter(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let publisher = retry(Flaky::new(vec![503, 429]), 3);
        publisher.publish("t", "c").await.unwrap();
        assert_eq!(*publisher.inner().calls.borrow(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let publisher = retry(Flaky::new(vec![500, 500, 500]), 2);
        let err = publisher.publish("t", "c").await.unwrap_err();
        assert!(matches!(err, PublishError::Status { status: 500, .. }));
        assert_eq!(*publisher.inner().calls.borrow(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let publisher = retry(Flaky::new(vec![401]), 5);
        assert!(publisher.publish("t", "c").await.is_err());
        assert_eq!(*publisher.inner().calls.borrow(), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let publisher = Retry::new(Flaky::new(vec![]), 10, Duration::from_secs(8))
            .with_jitter(Duration::ZERO);
        assert_eq!(publisher.backoff(1), Duration::from_secs(8));
        assert_eq!(publisher.backoff(2), Duration::from_secs(16));
        assert_eq!(publisher.backoff(3), Duration::from_secs(30));
        assert_eq!(publisher.backoff(40), Duration::from_secs(30));
    }
}
