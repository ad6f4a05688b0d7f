use connectors::error::BackendError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Whether an error is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// Terminal result of running an operation under the policy.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Classified as fatal; bubbled up untouched.
    Fatal(E),
    /// Retryable, but the attempt budget ran out.
    AttemptsExceeded(E),
}

/// Bounded exponential backoff for synchronous backend calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Preset for scroll-page and bulk-write calls.
    pub fn for_backend() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }

    /// A policy that never retries; useful in tests.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub async fn run<F, Fut, T, E, C>(&self, mut op: F, classify: C) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> RetryDisposition,
    {
        for attempt in 0.. {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if classify(&err) == RetryDisposition::Stop {
                return Err(RetryError::Fatal(err));
            }
            if attempt + 1 >= self.max_attempts {
                return Err(RetryError::AttemptsExceeded(err));
            }
            sleep(self.backoff_delay(attempt)).await;
        }
        unreachable!("retry loop always returns")
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        let shift = attempt.min(6) as u32;
        let delay = self
            .base_delay
            .checked_mul(1 << shift)
            .unwrap_or(self.max_delay);
        delay.min(self.max_delay)
    }
}

pub fn classify_backend_error(err: &BackendError) -> RetryDisposition {
    if err.is_transient() {
        RetryDisposition::Retry
    } else {
        RetryDisposition::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn transient_errors_retry_until_budget_runs_out() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO);

        let result: Result<(), _> = policy
            .run(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(BackendError::Unavailable("down".to_string())) }
                },
                classify_backend_error,
            )
            .await;

        assert!(matches!(result, Err(RetryError::AttemptsExceeded(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_stop_on_first_attempt() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::new(5, Duration::ZERO, Duration::ZERO);

        let result: Result<(), _> = policy
            .run(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async {
                        Err(BackendError::CursorExpired {
                            scroll_id: "s".to_string(),
                        })
                    }
                },
                classify_backend_error,
            )
            .await;

        assert!(matches!(result, Err(RetryError::Fatal(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_after_transient_failure() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO);

        let result = policy
            .run(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n == 0 {
                            Err(BackendError::Unavailable("blip".to_string()))
                        } else {
                            Ok(n)
                        }
                    }
                },
                classify_backend_error,
            )
            .await;

        assert!(matches!(result, Ok(1)));
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_millis(200), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(400));
        assert_eq!(policy.backoff_delay(9), Duration::from_secs(1));
    }
}
