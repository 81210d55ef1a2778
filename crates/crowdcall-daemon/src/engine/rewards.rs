//! Reward distribution engine.
//!
//! XP grants are not naturally idempotent, so every grant is keyed by the
//! vote or resolution that caused it and recorded in the `reward_grants`
//! table. Replaying a grant key is a no-op, which makes retries after
//! partial failure safe.

use tracing::info;

use super::badges::BadgeEngine;
use super::EngineError;
use crate::storage::{Database, UserBadgeRow};

/// Flat XP for casting any vote, independent of correctness.
pub const PARTICIPATION_XP: i64 = 5;

/// Additional XP for a vote matching the resolved outcome.
pub const CORRECTNESS_XP: i64 = 10;

/// Grants participation and correctness bonuses exactly once per cause,
/// then re-evaluates badges at the user's new XP.
#[derive(Clone)]
pub struct RewardEngine {
    db: Database,
    badges: BadgeEngine,
}

impl RewardEngine {
    pub const fn new(db: Database, badges: BadgeEngine) -> Self {
        Self { db, badges }
    }

    /// Grant the participation bonus for a vote: +5 XP and one more vote
    /// counted on the user. Keyed by the vote id; at most once per vote.
    ///
    /// Returns the badges newly unlocked by the XP change.
    pub async fn award_participation(
        &self,
        user_id: &str,
        vote_id: &str,
    ) -> Result<Vec<UserBadgeRow>, EngineError> {
        let grant_key = format!("participation:{vote_id}");
        let applied = self
            .db
            .apply_reward_grant(&grant_key, user_id, PARTICIPATION_XP, 0, 1)
            .await
            .map_err(|e| EngineError::RewardApplication {
                user_id: user_id.to_string(),
                reason: e.to_string(),
            })?;

        if !applied {
            return Ok(Vec::new());
        }

        self.evaluate_badges(user_id).await
    }

    /// Grant the correctness bonus after a resolution: +10 XP and one more
    /// correct prediction. Keyed by (prediction, user); at most once per
    /// resolution even when the sweeper and an admin race.
    pub async fn award_correctness(
        &self,
        user_id: &str,
        prediction_id: &str,
    ) -> Result<Vec<UserBadgeRow>, EngineError> {
        let grant_key = format!("correctness:{prediction_id}:{user_id}");
        let applied = self
            .db
            .apply_reward_grant(&grant_key, user_id, CORRECTNESS_XP, 1, 0)
            .await
            .map_err(|e| EngineError::RewardApplication {
                user_id: user_id.to_string(),
                reason: e.to_string(),
            })?;

        if !applied {
            return Ok(Vec::new());
        }

        info!(
            user_id = %user_id,
            prediction_id = %prediction_id,
            xp = CORRECTNESS_XP,
            "Correctness bonus granted"
        );

        self.evaluate_badges(user_id).await
    }

    /// Badge evaluation runs synchronously after any XP change, with the
    /// post-update XP value.
    async fn evaluate_badges(&self, user_id: &str) -> Result<Vec<UserBadgeRow>, EngineError> {
        let user = self.db.get_user(user_id).await?;
        self.badges.check_and_award(user_id, user.xp).await
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn setup() -> (Database, RewardEngine) {
        let db = Database::open_in_memory().await.unwrap();
        db.create_user("u1", None, None, None).await.unwrap();
        let engine = RewardEngine::new(db.clone(), BadgeEngine::new(db.clone()));
        (db, engine)
    }

    #[tokio::test]
    async fn participation_grants_five_xp_once() {
        let (db, engine) = setup().await;

        engine.award_participation("u1", "v1").await.unwrap();
        engine.award_participation("u1", "v1").await.unwrap();

        let user = db.get_user("u1").await.unwrap();
        assert_eq!(user.xp, PARTICIPATION_XP);
        assert_eq!(user.total_predictions, 1);
        assert_eq!(user.correct_predictions, 0);
    }

    #[tokio::test]
    async fn correctness_grants_ten_xp_once_per_resolution() {
        let (db, engine) = setup().await;

        engine.award_correctness("u1", "p1").await.unwrap();
        engine.award_correctness("u1", "p1").await.unwrap();

        let user = db.get_user("u1").await.unwrap();
        assert_eq!(user.xp, CORRECTNESS_XP);
        assert_eq!(user.correct_predictions, 1);
        assert_eq!(user.total_predictions, 0);
    }

    #[tokio::test]
    async fn distinct_votes_accumulate_participation() {
        let (db, engine) = setup().await;

        for vote_id in ["v1", "v2", "v3"] {
            engine.award_participation("u1", vote_id).await.unwrap();
        }

        let user = db.get_user("u1").await.unwrap();
        assert_eq!(user.xp, 3 * PARTICIPATION_XP);
        assert_eq!(user.total_predictions, 3);
    }

    #[tokio::test]
    async fn xp_change_triggers_badge_evaluation() {
        let (_db, engine) = setup().await;

        // Ten votes reach 50 XP, unlocking welcome plus the 50 XP badge.
        let mut all_granted = Vec::new();
        for i in 0..10 {
            let granted = engine
                .award_participation("u1", &format!("v{i}"))
                .await
                .unwrap();
            all_granted.extend(granted);
        }

        let ids: Vec<&str> = all_granted.iter().map(|b| b.badge_id.as_str()).collect();
        assert!(ids.contains(&"welcome"));
        assert!(ids.contains(&"great_start"));
    }

    #[tokio::test]
    async fn missing_user_is_reward_application_error() {
        let (_db, engine) = setup().await;

        let err = engine.award_correctness("ghost", "p1").await;
        assert!(matches!(err, Err(EngineError::RewardApplication { .. })));
    }
}
