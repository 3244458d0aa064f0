use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use time::{OffsetDateTime, Duration};
use tracing::{warn, error};

/// Sliding-window attempt counter keyed by caller. An attempt counts against
/// its key for exactly one window length after it was made.
#[derive(Debug)]
pub struct RateLimiter {
    attempts: Mutex<HashMap<String, VecDeque<OffsetDateTime>>>,
    max_attempts: u32,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(5, 1)
    }
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window_minutes: i64) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            max_attempts,
            window: Duration::minutes(window_minutes.max(1)),
        }
    }

    /// Records an attempt for `key`. On refusal returns how many whole minutes
    /// until the oldest attempt leaves the window (at least 1).
    pub fn check(&self, key: &str) -> Result<(), i64> {
        self.check_at(key, OffsetDateTime::now_utc())
    }

    pub fn check_at(&self, key: &str, now: OffsetDateTime) -> Result<(), i64> {
        let mut attempts = match self.attempts.lock() {
            Ok(guard) => guard,
            Err(e) => {
                // Fail open.
                error!("Failed to acquire rate limit lock: {}", e);
                return Ok(());
            }
        };

        let window = self.window;
        attempts.retain(|_, recent| {
            recent.retain(|at| now - *at < window);
            !recent.is_empty()
        });

        let recent = attempts.entry(key.to_string()).or_default();
        if recent.len() >= self.max_attempts as usize {
            let wait = recent
                .front()
                .map(|oldest| *oldest + window - now)
                .unwrap_or(window);
            let minutes = (wait.whole_seconds() + 59) / 60;
            warn!("Rate limit triggered for key {}", key);
            return Err(minutes.max(1));
        }

        recent.push_back(now);
        Ok(())
    }
}
