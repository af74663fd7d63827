//! Per-client login throttling.
//!
//! Sliding-window attempt counter keyed by client network identity. The
//! window resets lazily on the next attempt after expiry; a background sweep
//! evicts records for clients that stopped trying, so the map stays bounded.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::AuthError;

/// Attempt-counting window. Policy constant.
const WINDOW: Duration = Duration::from_secs(5 * 60);

/// Attempts allowed within a window before blocking. Policy constant.
const MAX_ATTEMPTS: u32 = 20;

/// How often the sweeper evicts stale entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug)]
struct AttemptWindow {
    attempts: u32,
    window_start: Instant,
}

/// Sliding-window login throttle, shared process-wide.
///
/// Counting is approximate under true parallelism (read-increment-write per
/// key); lost increments are an accepted throttling imprecision.
#[derive(Debug, Default)]
pub struct LoginThrottle {
    windows: DashMap<String, AttemptWindow>,
}

impl LoginThrottle {
    /// Create a new throttle.
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Record one login attempt for `client_key` and decide whether it may
    /// proceed. Returns `Throttled` once the window holds more than
    /// `MAX_ATTEMPTS` attempts.
    pub fn check(&self, client_key: &str) -> Result<(), AuthError> {
        self.check_at(client_key, Instant::now())
    }

    fn check_at(&self, client_key: &str, now: Instant) -> Result<(), AuthError> {
        let mut entry = self
            .windows
            .entry(client_key.to_string())
            .or_insert_with(|| AttemptWindow {
                attempts: 0,
                window_start: now,
            });

        if now.duration_since(entry.window_start) > WINDOW {
            entry.attempts = 0;
            entry.window_start = now;
        }

        entry.attempts += 1;

        if entry.attempts > MAX_ATTEMPTS {
            warn!(client_key, attempts = entry.attempts, "login throttled");
            return Err(AuthError::Throttled);
        }

        Ok(())
    }

    /// Evict entries whose window has fully elapsed.
    pub fn sweep(&self) {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) {
        // Counted inside the closure: a len() diff would race with inserts
        // landing in shards retain has already released.
        let mut evicted = 0usize;
        self.windows.retain(|_, window| {
            let keep = now.duration_since(window.window_start) <= WINDOW;
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            debug!(evicted, "swept stale throttle entries");
        }
    }

    /// Spawn the periodic sweeper task.
    pub fn spawn_sweeper(self: &Arc<Self>) {
        let throttle = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.tick().await; // first tick fires immediately
            loop {
                interval.tick().await;
                throttle.sweep();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempts_within_limit_proceed() {
        let throttle = LoginThrottle::new();
        let now = Instant::now();

        for _ in 0..MAX_ATTEMPTS {
            assert!(throttle.check_at("10.0.0.1", now).is_ok());
        }
    }

    #[test]
    fn test_attempt_over_limit_is_throttled() {
        let throttle = LoginThrottle::new();
        let now = Instant::now();

        for _ in 0..MAX_ATTEMPTS {
            throttle.check_at("10.0.0.1", now).unwrap();
        }
        assert!(matches!(
            throttle.check_at("10.0.0.1", now),
            Err(AuthError::Throttled)
        ));
        // Stays blocked within the window.
        assert!(matches!(
            throttle.check_at("10.0.0.1", now + Duration::from_secs(60)),
            Err(AuthError::Throttled)
        ));
    }

    #[test]
    fn test_clients_are_counted_independently() {
        let throttle = LoginThrottle::new();
        let now = Instant::now();

        for _ in 0..=MAX_ATTEMPTS {
            let _ = throttle.check_at("10.0.0.1", now);
        }
        assert!(throttle.check_at("10.0.0.2", now).is_ok());
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let throttle = LoginThrottle::new();
        let start = Instant::now();

        for _ in 0..=MAX_ATTEMPTS {
            let _ = throttle.check_at("10.0.0.1", start);
        }

        let later = start + WINDOW + Duration::from_secs(1);
        assert!(throttle.check_at("10.0.0.1", later).is_ok());
    }

    #[test]
    fn test_sweep_tolerates_concurrent_attempts() {
        let throttle = LoginThrottle::new();
        let now = Instant::now();

        // Inserts landing while retain walks the shards must not corrupt
        // the eviction accounting.
        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..1000u32 {
                    let key = format!("10.1.{}.{}", i / 256, i % 256);
                    let _ = throttle.check_at(&key, now);
                }
            });
            for _ in 0..100 {
                throttle.sweep_at(now);
            }
        });
    }

    #[test]
    fn test_sweep_evicts_only_stale_entries() {
        let throttle = LoginThrottle::new();
        let start = Instant::now();

        throttle.check_at("stale", start).unwrap();
        let later = start + WINDOW + Duration::from_secs(1);
        throttle.check_at("fresh", later).unwrap();

        throttle.sweep_at(later);
        assert!(!throttle.windows.contains_key("stale"));
        assert!(throttle.windows.contains_key("fresh"));
    }
}
