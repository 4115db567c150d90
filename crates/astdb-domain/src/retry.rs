//! Retry, circuit breaker and bounded-concurrency error collection.
//!
//! Grounded on the teacher's convention of small, composable resilience
//! primitives rather than a single "resilience framework" type; each piece
//! here is independently usable.

use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::Error;

/// Configuration for [`with_retry`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        }
    }
}

/// Default transient-failure predicate: retries on `Timeout` and on
/// `Filesystem` errors carrying an OS code in `{EAGAIN, EBUSY, EMFILE}`.
#[must_use]
pub fn default_should_retry(err: &Error) -> bool {
    use crate::error::ErrorKind;
    match err.kind {
        ErrorKind::Timeout => true,
        ErrorKind::Filesystem => err
            .context
            .get("os_code")
            .is_some_and(|c| matches!(c.as_str(), "EAGAIN" | "EBUSY" | "EMFILE")),
        _ => false,
    }
}

/// Calls `f` up to `1 + max_retries` times, sleeping
/// `initial_delay * backoff_multiplier^i` after the `i`-th (0-based)
/// failed attempt, as long as `should_retry` accepts the error.
pub async fn with_retry<T, F, Fut, R>(
    config: &RetryConfig,
    should_retry: R,
    mut f: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
    R: Fn(&Error) -> bool,
{
    let mut attempt: u32 = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= config.max_retries || !should_retry(&err) {
                    return Err(err);
                }
                let delay_ms = (config.initial_delay.as_millis() as f64)
                    * config.backoff_multiplier.powi(attempt as i32);
                tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
                attempt += 1;
            }
        }
    }
}

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through normally.
    Closed,
    /// Calls are rejected immediately without invoking the guarded function.
    Open,
    /// A single probe call is allowed through to test recovery.
    HalfOpen,
}

/// Configuration for [`CircuitBreaker`].
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the breaker opens.
    pub failure_threshold: u32,
    /// How long a probe call may run before counting as a failure.
    pub timeout: Duration,
    /// How long to stay open before allowing a half-open probe.
    pub reset_timeout: Duration,
}

/// Guards a fallible async operation, opening after repeated failures and
/// rejecting calls immediately until `reset_timeout` elapses.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    consecutive_failures: AtomicU32,
    state: Mutex<CircuitState>,
    opened_at_ms: AtomicU64,
    probe_in_flight: Mutex<bool>,
}

impl CircuitBreaker {
    /// Create a new, closed circuit breaker.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            consecutive_failures: AtomicU32::new(0),
            state: Mutex::new(CircuitState::Closed),
            opened_at_ms: AtomicU64::new(0),
            probe_in_flight: Mutex::new(false),
        }
    }

    /// Current state, transitioning `Open` to `HalfOpen` if the reset
    /// timeout has elapsed since it opened.
    #[must_use]
    pub fn state(&self, now_ms: u64) -> CircuitState {
        #[allow(clippy::unwrap_used, reason = "mutex is never poisoned in practice")]
        let mut state = self.state.lock().unwrap();
        if *state == CircuitState::Open {
            let opened_at = self.opened_at_ms.load(Ordering::SeqCst);
            if now_ms.saturating_sub(opened_at) >= self.config.reset_timeout.as_millis() as u64 {
                *state = CircuitState::HalfOpen;
            }
        }
        *state
    }

    /// Execute `f`, guarded by the breaker's state. `now_ms` is supplied by
    /// the caller so the breaker stays free of a hidden clock dependency.
    pub async fn call<T, F, Fut>(&self, now_ms: u64, f: F) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        match self.state(now_ms) {
            CircuitState::Open => {
                return Err(Error::timeout("circuit breaker open").with_context(
                    "retry_after_ms",
                    self.config.reset_timeout.as_millis().to_string(),
                ));
            }
            CircuitState::HalfOpen => {
                #[allow(clippy::unwrap_used, reason = "mutex is never poisoned in practice")]
                let mut probe = self.probe_in_flight.lock().unwrap();
                if *probe {
                    return Err(Error::timeout("circuit breaker half-open probe in flight"));
                }
                *probe = true;
            }
            CircuitState::Closed => {}
        }

        let result = f().await;

        match &result {
            Ok(_) => self.on_success(),
            Err(_) => self.on_failure(now_ms),
        }

        #[allow(clippy::unwrap_used, reason = "mutex is never poisoned in practice")]
        {
            *self.probe_in_flight.lock().unwrap() = false;
        }

        result
    }

    fn on_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        #[allow(clippy::unwrap_used, reason = "mutex is never poisoned in practice")]
        {
            *self.state.lock().unwrap() = CircuitState::Closed;
        }
    }

    fn on_failure(&self, now_ms: u64) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.config.failure_threshold {
            #[allow(clippy::unwrap_used, reason = "mutex is never poisoned in practice")]
            {
                *self.state.lock().unwrap() = CircuitState::Open;
            }
            self.opened_at_ms.store(now_ms, Ordering::SeqCst);
        }
    }
}

/// Outcome of [`execute_with_error_collection`].
#[derive(Debug)]
pub struct CollectedResults<T> {
    /// Successful task outputs, in completion order.
    pub results: Vec<T>,
    /// Errors from failed tasks, in completion order.
    pub errors: Vec<Error>,
}

/// Runs `tasks` with bounded concurrency `max_concurrency`. If
/// `continue_on_error` is false, returns as soon as the first task fails;
/// otherwise every task runs and both successes and failures are
/// collected.
pub async fn execute_with_error_collection<T, Fut, I>(
    tasks: I,
    max_concurrency: usize,
    continue_on_error: bool,
) -> Result<CollectedResults<T>, Error>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, Error>> + Send + 'static,
    I: IntoIterator<Item = Fut>,
{
    use futures::stream::{self, StreamExt};

    let max_concurrency = max_concurrency.max(1);
    let mut results = Vec::new();
    let mut errors = Vec::new();

    let mut stream = stream::iter(tasks).buffer_unordered(max_concurrency);
    while let Some(outcome) = stream.next().await {
        match outcome {
            Ok(value) => results.push(value),
            Err(err) => {
                if !continue_on_error {
                    return Err(err);
                }
                errors.push(err);
            }
        }
    }

    Ok(CollectedResults { results, errors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32 as Counter;
    use std::sync::Arc;

    #[tokio::test]
    async fn with_retry_succeeds_on_third_attempt() {
        let calls = Arc::new(Counter::new(0));
        let config = RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            backoff_multiplier: 2.0,
        };
        let calls_clone = Arc::clone(&calls);
        let result = with_retry(&config, |_| true, move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(Error::timeout("network timeout"))
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_retry_gives_up_after_max_retries() {
        let calls = Arc::new(Counter::new(0));
        let config = RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            backoff_multiplier: 1.0,
        };
        let calls_clone = Arc::clone(&calls);
        let result: Result<(), Error> = with_retry(&config, |_| true, move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::timeout("always fails"))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn circuit_breaker_opens_after_threshold_then_half_opens() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            timeout: Duration::from_millis(50),
            reset_timeout: Duration::from_millis(10),
        });

        for _ in 0..2 {
            let _: Result<(), Error> = breaker.call(0, || async { Err(Error::timeout("boom")) }).await;
        }
        assert_eq!(breaker.state(0), CircuitState::Open);

        let rejected: Result<(), Error> = breaker.call(1, || async { Ok(()) }).await;
        assert!(rejected.is_err());

        assert_eq!(breaker.state(100), CircuitState::HalfOpen);
        let probe: Result<(), Error> = breaker.call(100, || async { Ok(()) }).await;
        assert!(probe.is_ok());
        assert_eq!(breaker.state(100), CircuitState::Closed);
    }

    #[tokio::test]
    async fn error_collection_continues_past_failures() {
        let tasks = (0..5).map(|i| async move {
            if i == 2 {
                Err(Error::parser("bad file"))
            } else {
                Ok(i)
            }
        });
        let collected = execute_with_error_collection(tasks, 2, true).await.unwrap();
        assert_eq!(collected.results.len(), 4);
        assert_eq!(collected.errors.len(), 1);
    }

    #[tokio::test]
    async fn error_collection_fails_fast_when_disabled() {
        let tasks = (0..5).map(|i| async move {
            if i == 1 {
                Err(Error::parser("bad file"))
            } else {
                Ok(i)
            }
        });
        let result = execute_with_error_collection(tasks, 1, false).await;
        assert!(result.is_err());
    }
}
