//! Bounded polling with exponential backoff

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry configuration for provider polling
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (probe calls)
    pub max_attempts: u32,

    /// Delay after the first unsuccessful attempt
    pub initial_delay: Duration,

    /// Upper bound for a single delay
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    /// 10 attempts, 100ms doubling each time (~51s worst case).
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay to wait after the given zero-based attempt failed
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }

    /// Sum of every delay the poll loop can sleep through
    pub fn worst_case_wait(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.delay_for_attempt(attempt))
            .sum()
    }
}

/// Outcome of [`poll_until`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The probe produced a value on the given zero-based attempt
    Ready { value: T, attempt: u32 },
    /// Every attempt was used without success
    Exhausted,
}

/// Call `probe` until it yields `Ok(Some(_))` or the attempt budget runs out.
///
/// No sleep follows the final attempt. Errors from the probe abort the loop.
/// Dropping the returned future stops polling between attempts.
pub async fn poll_until<T, E, F, Fut>(
    config: &RetryConfig,
    mut probe: F,
) -> std::result::Result<PollOutcome<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<Option<T>, E>>,
{
    for attempt in 0..config.max_attempts {
        if let Some(value) = probe(attempt).await? {
            return Ok(PollOutcome::Ready { value, attempt });
        }

        if attempt + 1 < config.max_attempts {
            let delay = config.delay_for_attempt(attempt);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Not ready, backing off");
            sleep(delay).await;
        }
    }

    Ok(PollOutcome::Exhausted)
}
