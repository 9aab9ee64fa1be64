// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Bounded exponential backoff: `attempts` tries, delay doubling from
/// `initial_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: usize, initial_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            initial_delay,
        }
    }

    /// Delay slept after the given 1-based attempt failed.
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(16) as u32;
        self.initial_delay.saturating_mul(1u32 << shift)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250))
    }
}

/// Retry only while `should_retry` accepts the error; anything else is
/// returned on first sight.
pub async fn retry_when<F, Fut, T, E, P>(
    mut op: F,
    policy: RetryPolicy,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < policy.attempts && should_retry(&e) => {
                sleep(policy.delay_after(attempt)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
