use std::time::Duration;

use backoff::backoff::Backoff;

/// Reconnection delay for `attempt`: `min(base * attempt, max)`.
///
/// Attempts are counted from 1; an attempt of 0 is treated as the first one.
#[must_use]
pub fn delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    base.saturating_mul(attempt.max(1)).min(max)
}

/// Linear, capped, jitter-free backoff.
///
/// The attempt counter doubles as the client's retry count: it is bumped by every call to
/// [`Backoff::next_backoff`] and cleared by [`Backoff::reset`] once a connection opens.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl LinearBackoff {
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    /// Number of failed or lost connections since the last successful open.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Backoff for LinearBackoff {
    fn reset(&mut self) {
        self.attempt = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt = self.attempt.saturating_add(1);
        Some(delay(self.attempt, self.base, self.max))
    }
}
