//! Trailing-window limit on comment creation.
//!
//! The limiter keeps no counters of its own: every check is a range count
//! against durable comment storage, so it holds across restarts and across
//! server instances. Two near-simultaneous requests may both be admitted.

use std::sync::Arc;

use chrono::Duration;

use crate::clock::Clock;
use crate::comments::CommentStore;
use crate::error::{CoreError, CoreResult};
use crate::types::DbId;

/// Default trailing window.
pub const DEFAULT_WINDOW_SECS: i64 = 5 * 60;

/// Default number of comments admitted per window.
pub const DEFAULT_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub limit: i64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window: Duration::seconds(DEFAULT_WINDOW_SECS),
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    comments: CommentStore,
    clock: Arc<dyn Clock>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(comments: CommentStore, clock: Arc<dyn Clock>, policy: RateLimitPolicy) -> Self {
        Self {
            comments,
            clock,
            policy,
        }
    }

    /// Admit `identity` if it has fewer than `limit` comments inside the
    /// trailing window, otherwise fail with [`CoreError::TooManyRequests`].
    pub async fn check_and_admit(&self, identity: DbId) -> CoreResult<()> {
        let now = self.clock.now();
        let recent = self
            .comments
            .count_by_commenter_between(identity, now - self.policy.window, now)
            .await?;

        if recent >= self.policy.limit {
            tracing::warn!(
                user_id = identity,
                recent,
                limit = self.policy.limit,
                "Comment rate limit exceeded"
            );
            return Err(CoreError::TooManyRequests(format!(
                "You're doing that too much. Try again in {} minutes.",
                self.policy.window.num_minutes().max(1)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;
    use crate::testing::{ManualClock, MemoryDatabase};

    fn setup() -> (Arc<MemoryDatabase>, Arc<ManualClock>, RateLimiter) {
        let db = Arc::new(MemoryDatabase::new());
        db.add_user(1, "Indy", false, 0);
        db.add_user(2, "Sassy", false, 0);
        let clock = Arc::new(ManualClock::new(
            chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let limiter = RateLimiter::new(
            CommentStore::new(db.clone()),
            clock.clone(),
            RateLimitPolicy::default(),
        );
        (db, clock, limiter)
    }

    #[tokio::test]
    async fn admits_below_limit() {
        let (db, clock, limiter) = setup();
        for _ in 0..4 {
            db.seed_comment(1, "p", "hey", clock.now());
        }
        assert!(limiter.check_and_admit(1).await.is_ok());
    }

    #[tokio::test]
    async fn denies_at_limit_then_admits_after_window() {
        let (db, clock, limiter) = setup();
        for _ in 0..5 {
            db.seed_comment(1, "p", "hey", clock.now());
        }

        clock.advance(Duration::minutes(1));
        assert_matches!(
            limiter.check_and_admit(1).await,
            Err(CoreError::TooManyRequests(_))
        );

        clock.advance(Duration::minutes(4) + Duration::seconds(1));
        assert!(limiter.check_and_admit(1).await.is_ok());
    }

    #[tokio::test]
    async fn counts_are_per_identity() {
        let (db, clock, limiter) = setup();
        for _ in 0..5 {
            db.seed_comment(1, "p", "hey", clock.now());
        }
        assert!(limiter.check_and_admit(2).await.is_ok());
    }

    #[tokio::test]
    async fn future_dated_comments_are_not_counted() {
        let (db, clock, limiter) = setup();
        for _ in 0..5 {
            db.seed_comment(1, "p", "hey", clock.now() + Duration::minutes(2));
        }
        assert!(limiter.check_and_admit(1).await.is_ok());

        clock.advance(Duration::minutes(2));
        assert_matches!(
            limiter.check_and_admit(1).await,
            Err(CoreError::TooManyRequests(_))
        );
    }

    #[tokio::test]
    async fn custom_policy_is_honoured() {
        let (db, clock, _) = setup();
        let limiter = RateLimiter::new(
            CommentStore::new(db.clone()),
            clock.clone(),
            RateLimitPolicy {
                window: Duration::seconds(30),
                limit: 1,
            },
        );
        db.seed_comment(1, "p", "hey", clock.now());
        assert!(limiter.check_and_admit(1).await.is_err());
        clock.advance(Duration::seconds(31));
        assert!(limiter.check_and_admit(1).await.is_ok());
    }
}
