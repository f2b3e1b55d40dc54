//! Bounded exponential backoff for remote operations.

use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Fresh sequence of delays, one per allowed retry.
    pub fn delays(&self) -> ExponentialBackoff {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay.max(self.initial_delay))
            .with_factor(2.0)
            .with_max_times(self.max_retries)
            .build()
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn should_yield_one_delay_per_retry() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));

        assert_eq!(policy.delays().count(), 4);
    }

    #[test]
    fn should_double_delays_up_to_cap() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
        };

        let delays: Vec<Duration> = policy.delays().collect();

        // backoff is computed in floating point
        assert_eq!(delays[0].as_millis(), 100);
        assert_eq!(delays[1].as_millis(), 200);
        assert!(delays.iter().all(|d| *d <= Duration::from_millis(300)));
    }

    #[test]
    fn should_allow_no_retries() {
        let policy = RetryPolicy::new(0, Duration::ZERO);

        assert_eq!(policy.delays().next(), None);
    }
}
