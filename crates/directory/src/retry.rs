//! Retry logic with exponential backoff for transient errors.

use crate::error::{Error, Result};
use crate::types::RetryConfig;
use std::thread;
use std::time::Duration;

/// Callback trait for retry progress notifications.
pub trait RetryCallback: Send + Sync {
    /// Called when an operation is being retried.
    ///
    /// # Arguments
    /// * `attempt` - Attempt that just failed (1-indexed)
    /// * `max_attempts` - Maximum number of attempts
    /// * `error` - The error that triggered the retry
    /// * `delay` - Time until the next attempt
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration);
}

/// Execute an operation, retrying errors for which `should_retry` holds.
///
/// A `Retry-After` delay carried by the error takes precedence over the
/// computed backoff, capped at `config.max_delay`.
pub fn with_retry_if<T, F, P>(
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    should_retry: P,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
    P: Fn(&Error) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !should_retry(&e) || attempt + 1 >= max_attempts {
                    return Err(e);
                }

                let delay = e
                    .retry_after()
                    .map(|d| d.min(config.max_delay))
                    .unwrap_or_else(|| config.delay_for_attempt(attempt));

                if let Some(cb) = callback {
                    cb.on_retry(attempt + 1, max_attempts, &e, delay);
                }

                thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}
