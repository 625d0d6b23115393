//! Exponential-backoff retry wrapper around a fallible async operation.

use std::future::Future;
use std::time::Duration;

use tracing::error;

const DEFAULT_MIN_BACKOFF: Duration = Duration::from_secs(2);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(64);

/// Doubles `current`, wrapping back to `min` instead of clamping once the
/// double would exceed `max`: `2,4,8,16,32,64,2,4,…` rather than
/// `2,4,8,16,32,64,64,64,…`.
fn next_backoff(current: Duration, min: Duration, max: Duration) -> Duration {
    let doubled = current * 2;
    if doubled > max {
        min
    } else {
        doubled
    }
}

/// Runs an async operation forever, doubling the sleep between failed
/// attempts from `min` up to `max` and resetting to `min` on the next
/// success. A single successful pass is enough to reset the backoff, even
/// if that pass itself logged partial, per-item failures internally.
pub struct Supervisor {
    min_backoff: Duration,
    max_backoff: Duration,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self {
            min_backoff: DEFAULT_MIN_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl Supervisor {
    pub fn new(min_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            min_backoff,
            max_backoff,
        }
    }

    /// Calls `attempt` repeatedly, sleeping on `Err` with doubling backoff
    /// and resetting to `min_backoff` after any `Ok`. Never returns.
    pub async fn run<F, Fut, E>(&self, label: &str, mut attempt: F) -> !
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        let mut backoff = self.min_backoff;

        loop {
            match attempt().await {
                Ok(()) => {
                    backoff = self.min_backoff;
                }
                Err(err) => {
                    error!(label, %err, backoff_secs = backoff.as_secs(), "supervised operation failed");
                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff, self.min_backoff, self.max_backoff);
                    continue;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `run`'s sleep sequence is exactly the sequence of `backoff` values
    /// fed into `next_backoff`, starting from `min`: once doubling would
    /// exceed `max` it wraps back to `min` instead of sticking at the cap.
    #[test]
    fn next_backoff_cycles_after_hitting_cap() {
        let min = Duration::from_secs(2);
        let max = Duration::from_secs(64);

        let mut backoff = min;
        let mut sequence = vec![backoff];
        for _ in 0..7 {
            backoff = next_backoff(backoff, min, max);
            sequence.push(backoff);
        }

        let expected: Vec<Duration> = [2, 4, 8, 16, 32, 64, 2, 4]
            .into_iter()
            .map(Duration::from_secs)
            .collect();
        assert_eq!(sequence, expected);
    }
}
