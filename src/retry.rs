use std::time::Duration;
use tracing::warn;

pub const RATE_LIMITED: u16 = 429;

/// Bounded retry: at most `max_attempts` calls, repeating only on `trigger_status`
/// after a fixed `backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub trigger_status: u16,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_secs(5),
            trigger_status: RATE_LIMITED,
        }
    }
}

impl RetryPolicy {
    /// Whether a response with `status` on attempt number `attempt` (1-based) earns another try.
    pub fn should_retry(&self, status: u16, attempt: u32) -> bool {
        status == self.trigger_status && attempt < self.max_attempts
    }

    /// Calls `op` until it yields a status the policy does not retry on.
    /// Errors from `op` are returned immediately. Returns the final value and
    /// the number of attempts made.
    pub fn run<T, E, Z, F, G>(&self, sleeper: &Z, mut op: F, status_of: G) -> Result<(T, u32), E>
    where
        Z: Sleeper + ?Sized,
        F: FnMut(u32) -> Result<T, E>,
        G: Fn(&T) -> u16,
    {
        let mut attempt = 1;
        loop {
            let value = op(attempt)?;
            let status = status_of(&value);
            if !self.should_retry(status, attempt) {
                return Ok((value, attempt));
            }

            warn!(
                action = "retry",
                component = "retry_policy",
                status,
                attempt,
                backoff_ms = self.backoff.as_millis(),
                "Rate limited, backing off before retrying"
            );
            sleeper.sleep(self.backoff);
            attempt += 1;
        }
    }
}

/// Blocking delay between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

impl<T: Sleeper + ?Sized> Sleeper for &T {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
