//! Retry and polling primitives.
//!
//! [`with_retry`] repeats one fallible operation a fixed number of times.
//! [`poll_first`] repeatedly tries an ordered list of detection strategies
//! and returns the first hit.

use std::fmt;
use std::thread;
use std::time::Duration;

/// Errors that know whether another attempt could help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for crate::error::TransferError {
    fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

/// Fixed-count retry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Callback trait for retry progress notifications.
pub trait RetryCallback {
    /// Called when an operation is about to be retried.
    ///
    /// `attempt` is the 1-indexed attempt that just failed.
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &dyn fmt::Display);
}

/// Execute an operation with retry logic.
///
/// Non-retryable errors are returned immediately. The closure receives the
/// 1-indexed attempt number.
pub fn with_retry<T, E, F>(
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    mut operation: F,
) -> Result<T, E>
where
    E: Retryable + fmt::Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() || attempt >= max_attempts => return Err(err),
            Err(err) => {
                if let Some(cb) = callback {
                    cb.on_retry(attempt, max_attempts, &err);
                }
                log::debug!("attempt {attempt}/{max_attempts} failed: {err}; retrying");
                if !config.delay.is_zero() {
                    thread::sleep(config.delay);
                }
                attempt += 1;
            }
        }
    }
}

/// Bounded polling configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Number of polling rounds
    pub attempts: u32,
    /// Pause between rounds
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_millis(500),
        }
    }
}

/// A named detection strategy.
pub struct Strategy<'a, T> {
    pub name: &'a str,
    pub detect: Box<dyn Fn() -> Option<T> + 'a>,
}

impl<'a, T> Strategy<'a, T> {
    pub fn new(name: &'a str, detect: impl Fn() -> Option<T> + 'a) -> Self {
        Self {
            name,
            detect: Box::new(detect),
        }
    }
}

/// Poll strategies in priority order until one yields a value.
///
/// Each round tries every strategy in order; the first hit wins. Rounds are
/// separated by `config.interval`. Returns `None` after `config.attempts`
/// fruitless rounds.
pub fn poll_first<T>(config: &PollConfig, strategies: &[Strategy<'_, T>]) -> Option<T> {
    for round in 1..=config.attempts {
        for strategy in strategies {
            if let Some(value) = (strategy.detect)() {
                log::debug!("{} matched on round {round}", strategy.name);
                return Some(value);
            }
        }
        if round < config.attempts && !config.interval.is_zero() {
            thread::sleep(config.interval);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferError;
    use std::cell::Cell;

    fn network() -> TransferError {
        TransferError::Network {
            message: "reset".into(),
        }
    }

    #[test]
    fn test_with_retry_success_first_try() {
        let result: Result<u32, TransferError> =
            with_retry(&RetryConfig::no_retry(), None, |_| Ok(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_with_retry_eventual_success() {
        let config = RetryConfig::new(2, Duration::ZERO);
        let attempts = Cell::new(0);

        let result = with_retry(&config, None, |attempt| {
            attempts.set(attempt);
            if attempt < 2 { Err(network()) } else { Ok("done") }
        });

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_with_retry_all_attempts_fail() {
        let config = RetryConfig::new(2, Duration::ZERO);
        let attempts = Cell::new(0);

        let result: Result<(), _> = with_retry(&config, None, |_| {
            attempts.set(attempts.get() + 1);
            Err(network())
        });

        assert_eq!(result.unwrap_err(), network());
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_with_retry_non_retryable_error() {
        let config = RetryConfig::new(2, Duration::ZERO);
        let attempts = Cell::new(0);

        let result: Result<(), _> = with_retry(&config, None, |_| {
            attempts.set(attempts.get() + 1);
            Err(TransferError::Status { status: 404 })
        });

        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_callback_invoked_between_attempts() {
        struct Counting(Cell<u32>);
        impl RetryCallback for Counting {
            fn on_retry(&self, _: u32, _: u32, _: &dyn fmt::Display) {
                self.0.set(self.0.get() + 1);
            }
        }

        let callback = Counting(Cell::new(0));
        let config = RetryConfig::new(3, Duration::ZERO);
        let _: Result<(), _> = with_retry(&config, Some(&callback), |_| Err(network()));

        assert_eq!(callback.0.get(), 2);
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let config = RetryConfig {
            max_attempts: 0,
            delay: Duration::ZERO,
        };
        let attempts = Cell::new(0);
        let _: Result<(), _> = with_retry(&config, None, |_| {
            attempts.set(attempts.get() + 1);
            Err(network())
        });
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_poll_first_priority_order() {
        let config = PollConfig {
            attempts: 3,
            interval: Duration::ZERO,
        };
        let strategies = [
            Strategy::new("env", || None),
            Strategy::new("socket", || Some(":1")),
            Strategy::new("who", || Some(":2")),
        ];
        assert_eq!(poll_first(&config, &strategies), Some(":1"));
    }

    #[test]
    fn test_poll_first_waits_for_late_strategy() {
        let config = PollConfig {
            attempts: 5,
            interval: Duration::ZERO,
        };
        let calls = Cell::new(0);
        let strategies = [Strategy::new("socket", || {
            calls.set(calls.get() + 1);
            (calls.get() == 3).then_some(":0")
        })];

        assert_eq!(poll_first(&config, &strategies), Some(":0"));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_poll_first_bounded() {
        let config = PollConfig {
            attempts: 4,
            interval: Duration::ZERO,
        };
        let calls = Cell::new(0);
        let strategies = [
            Strategy::new("a", || {
                calls.set(calls.get() + 1);
                None::<u8>
            }),
            Strategy::new("b", || None),
        ];

        assert_eq!(poll_first(&config, &strategies), None);
        assert_eq!(calls.get(), 4);
    }
}
