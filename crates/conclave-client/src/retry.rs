//! Exponential backoff with jitter, generalized from
//! `original_source/GitHub-Multi-Agent/shared/github_client.py::GitHubClient.request`
//! beyond GitHub specifics to any JSON-RPC endpoint (spec.md §4.6).

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff_cap: Duration::from_secs(16),
        }
    }
}

impl RetryPolicy {
    /// `2^(attempt-1)` seconds of base backoff plus up to 250ms of jitter,
    /// capped at `backoff_cap` — same shape as the Python client's
    /// `(2 ** (attempt - 1)) + random.uniform(0, 0.25)`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let base_secs = 2u64.saturating_pow(attempt.saturating_sub(1));
        let jitter_ms = rand::thread_rng().gen_range(0..250);
        let total = Duration::from_secs(base_secs) + Duration::from_millis(jitter_ms);
        total.min(self.backoff_cap)
    }

    /// `Retry-After` takes precedence over the default backoff when the
    /// server supplies a concrete integer second count (429 responses).
    pub fn backoff_for_429(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        match retry_after_secs {
            Some(secs) => Duration::from_secs(secs).min(self.backoff_cap),
            None => {
                let base = 2u64.saturating_pow(attempt);
                Duration::from_secs(base).min(self.backoff_cap)
            }
        }
    }

    pub fn is_last_attempt(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}
