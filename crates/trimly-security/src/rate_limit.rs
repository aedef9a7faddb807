//! Keyed rate limiting.

use governor::{
    clock::DefaultClock, middleware::NoOpMiddleware, state::keyed::DefaultKeyedStateStore, Quota,
    RateLimiter as GovernorRateLimiter,
};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use trimly_core::TrimlyError;

type KeyedLimiter =
    GovernorRateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock, NoOpMiddleware>;

/// Checks between two prunes of idle keys.
const DEFAULT_PRUNE_EVERY: u64 = 1024;

/// Rate limiter with an independent budget per key (for example a phone
/// number).
///
/// A key may spend `max_requests` at once; the budget then refills evenly
/// across `window`. Every few checks, keys whose budget has fully refilled
/// are forgotten, so the key store stays bounded by recent traffic.
pub struct KeyedRateLimiter {
    limiter: Arc<KeyedLimiter>,
    checks: Arc<AtomicU64>,
    prune_every: u64,
}

impl KeyedRateLimiter {
    /// Allows `max_requests` per key within `window`.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
        let period = window / burst.get();
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);
        Self {
            limiter: Arc::new(GovernorRateLimiter::keyed(quota)),
            checks: Arc::new(AtomicU64::new(0)),
            prune_every: DEFAULT_PRUNE_EVERY,
        }
    }

    /// Prunes idle keys after every `checks` calls to [`check`](Self::check).
    #[must_use]
    pub fn prune_every(mut self, checks: u64) -> Self {
        self.prune_every = checks.max(1);
        self
    }

    /// Spends one request for `key`.
    pub fn check(&self, key: &str) -> Result<(), TrimlyError> {
        let outcome = self.limiter.check_key(&key.to_string());
        let seen = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if seen % self.prune_every == 0 {
            self.shrink();
        }
        outcome.map_err(|_| TrimlyError::RateLimitExceeded)
    }

    /// Drops state for keys whose budget has fully refilled.
    pub fn shrink(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Number of keys currently holding state.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }
}

impl Clone for KeyedRateLimiter {
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
            checks: Arc::clone(&self.checks),
            prune_every: self.prune_every,
        }
    }
}

impl std::fmt::Debug for KeyedRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedRateLimiter")
            .field("prune_every", &self.prune_every)
            .finish_non_exhaustive()
    }
}
