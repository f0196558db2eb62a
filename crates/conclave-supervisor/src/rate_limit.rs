//! Per-session request throttling, keeping one noisy session from
//! starving others' turns (spec.md line 156: "supervisor enforces N
//! requests/minute/client"). Not present in the original Python corpus
//! (each specialist there had no governor-style limiter); grounded in
//! `other_examples` usage of the `governor` crate's keyed rate limiter,
//! which is the idiomatic Rust replacement for a hand-rolled token
//! bucket. Lives here, not in `conclave-server`, because the limit is
//! per chat client against the supervisor, not per specialist tool call.

use governor::clock::{Clock, DefaultClock};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

type KeyedLimiter = GovernorRateLimiter<String, governor::state::keyed::DashMapStateStore<String>, DefaultClock>;

pub struct SessionRateLimiter {
    limiter: KeyedLimiter,
    clock: DefaultClock,
}

impl SessionRateLimiter {
    /// `per_minute` chat turns allowed per session, bursting up to the
    /// same figure.
    pub fn new(per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute.max(1)).expect("max(1) is never zero"));
        Self {
            limiter: GovernorRateLimiter::dashmap(quota),
            clock: DefaultClock::default(),
        }
    }

    /// `Ok(())` if the session is within quota; `Err(retry_after)`
    /// otherwise, the duration to report in a `Retry-After` header.
    pub fn check(&self, session_id: &str) -> Result<(), Duration> {
        self.limiter.check_key(&session_id.to_string()).map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_calls_within_quota() {
        let limiter = SessionRateLimiter::new(100);
        assert!(limiter.check("sess-1").is_ok());
    }

    #[test]
    fn blocks_once_quota_is_exhausted() {
        let limiter = SessionRateLimiter::new(1);
        assert!(limiter.check("sess-1").is_ok());
        assert!(limiter.check("sess-1").is_err());
    }

    #[test]
    fn tracks_sessions_independently() {
        let limiter = SessionRateLimiter::new(1);
        assert!(limiter.check("sess-a").is_ok());
        assert!(limiter.check("sess-b").is_ok());
    }
}
