//! Failed-login throttling backed by Redis counters

use anyhow::Result;
use common::cache::RedisPool;
use tracing::{info, warn};

/// Failed-login limiter
#[derive(Clone)]
pub struct LoginThrottle {
    redis: RedisPool,
    max_attempts: u64,
    window_seconds: u64,
}

impl LoginThrottle {
    pub const MAX_ATTEMPTS: u64 = 5;
    pub const WINDOW_SECONDS: u64 = 15 * 60;

    pub fn new(redis: RedisPool) -> Self {
        Self {
            redis,
            max_attempts: Self::MAX_ATTEMPTS,
            window_seconds: Self::WINDOW_SECONDS,
        }
    }

    fn key(identifier: &str) -> String {
        format!("login_attempts:{}", identifier)
    }

    fn exhausted(&self, attempts: u64) -> bool {
        attempts >= self.max_attempts
    }

    /// Whether the identifier has used up its attempts for the window
    pub async fn is_locked(&self, identifier: &str) -> Result<bool> {
        let attempts = self
            .redis
            .get(&Self::key(identifier))
            .await?
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        Ok(self.exhausted(attempts))
    }

    /// Count a failed attempt; the window starts on the first failure
    pub async fn record_failure(&self, identifier: &str) -> Result<u64> {
        let attempts = self
            .redis
            .incr_with_window(&Self::key(identifier), self.window_seconds)
            .await?;

        if self.exhausted(attempts) {
            warn!("Login locked for {} after {} failures", identifier, attempts);
        }
        Ok(attempts)
    }

    pub async fn clear(&self, identifier: &str) -> Result<()> {
        self.redis.delete(&Self::key(identifier)).await?;
        info!("Cleared failed logins for {}", identifier);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::cache::RedisConfig;

    fn throttle() -> LoginThrottle {
        let pool = RedisPool::new(&RedisConfig {
            url: "redis://127.0.0.1:6379".into(),
            max_connections: 1,
        })
        .unwrap();
        LoginThrottle::new(pool)
    }

    #[test]
    fn keys_are_namespaced_per_identifier() {
        assert_eq!(LoginThrottle::key("jane"), "login_attempts:jane");
    }

    #[test]
    fn fifth_failure_locks() {
        let throttle = throttle();
        assert!(!throttle.exhausted(0));
        assert!(!throttle.exhausted(4));
        assert!(throttle.exhausted(5));
        assert!(throttle.exhausted(6));
    }

    #[test]
    fn window_is_fifteen_minutes() {
        assert_eq!(throttle().window_seconds, 900);
    }
}
