//! Fixed exponential backoff for remote calls, scheduled by `exponential_backoff`.

use exponential_backoff::Backoff;
use std::fmt::Display;
use std::time::Duration;

/// Blocks the calling thread between attempts. Injectable so tests don't wait.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Retry schedule: doubling waits from `initial_wait`, capped at `max_wait`, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_wait: Duration,
    pub max_wait: Duration,
}

impl RetryPolicy {
    /// Policy used when submitting data link configs: 4 attempts, 1s → 10s.
    pub const DATA_LINK_APPLY: RetryPolicy = RetryPolicy {
        max_attempts: 4,
        initial_wait: Duration::from_secs(1),
        max_wait: Duration::from_secs(10),
    };

    /// Backoff schedule for this policy: factor 2, jitter disabled.
    pub fn backoff(&self) -> Backoff {
        let mut backoff = Backoff::new(self.max_attempts, self.initial_wait, Some(self.max_wait));
        backoff.set_factor(2);
        backoff.set_jitter(0.0);
        backoff
    }

    /// Wait after the `attempt`-th (1-based) failed attempt.
    ///
    /// Attempts past the end of the schedule wait `max_wait`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff()
            .next(attempt.saturating_sub(1))
            .unwrap_or(self.max_wait)
            .min(self.max_wait)
    }

    /// Run `op` until it succeeds or attempts are exhausted.
    ///
    /// `op` receives the 1-based attempt number. The error of the final
    /// attempt is returned as-is.
    pub fn run<T, E, F>(&self, sleeper: &dyn Sleeper, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let max_attempts = self.max_attempts.max(1);
        let backoff = self.backoff();
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => {
                    tracing::error!(attempt, max_attempts, error = %e, "giving up");
                    return Err(e);
                }
                Err(e) => {
                    let delay = backoff
                        .next(attempt - 1)
                        .unwrap_or(self.max_wait)
                        .min(self.max_wait);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "attempt failed, retrying"
                    );
                    sleeper.sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DATA_LINK_APPLY
    }
}
