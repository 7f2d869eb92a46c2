//! Polling parameters.

use selfproof_types::Amount;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default gap between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Default attempt budget: 200 × 3 s ≈ 10 minutes.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 200;
/// Default number of recent transactions requested per poll.
pub const DEFAULT_FETCH_LIMIT: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Wait before each poll, including the first.
    pub poll_interval: Duration,
    /// Polls before giving up.
    pub max_attempts: u32,
    /// A payment matches if it differs from the expected amount by strictly less than this.
    pub tolerance: Amount,
    pub fetch_limit: usize,
}

impl WatchConfig {
    /// Wall-clock budget of one watch.
    pub fn budget(&self) -> Duration {
        self.poll_interval * self.max_attempts
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            tolerance: Amount::from_cents(1),
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_ten_minutes() {
        assert_eq!(WatchConfig::default().budget(), Duration::from_secs(600));
    }
}
