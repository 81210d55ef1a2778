//! Vote ledger: one vote per (user, prediction).

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::rewards::RewardEngine;
use super::EngineError;
use crate::mirror::{LedgerMirror, MirrorEvent};
use crate::storage::{Choice, Database, DatabaseError, UserBadgeRow};

/// Result of a successful vote: the vote id plus any badges unlocked by the
/// participation bonus, for UI notification.
#[derive(Debug, Clone)]
pub struct CastOutcome {
    pub vote_id: String,
    pub new_badges: Vec<UserBadgeRow>,
}

/// Records votes and drives the participation reward path.
#[derive(Clone)]
pub struct VoteLedger {
    db: Database,
    rewards: RewardEngine,
    mirror: Arc<dyn LedgerMirror>,
}

impl VoteLedger {
    pub fn new(db: Database, rewards: RewardEngine, mirror: Arc<dyn LedgerMirror>) -> Self {
        Self {
            db,
            rewards,
            mirror,
        }
    }

    /// Cast a vote on an active prediction.
    ///
    /// The vote insert and tally increments commit atomically; the
    /// participation grant is keyed by the vote id so it applies exactly
    /// once. A participation failure is logged and does not undo the vote,
    /// matching the per-user error policy for reward application.
    pub async fn cast_vote(
        &self,
        user_id: &str,
        prediction_id: &str,
        choice: Choice,
    ) -> Result<CastOutcome, EngineError> {
        // Surface NotFound for the user before touching the prediction.
        self.db.get_user(user_id).await?;

        let prediction = self.db.get_prediction(prediction_id).await?;
        if !prediction.is_active() {
            return Err(EngineError::AlreadyResolved);
        }

        let vote_id = Uuid::new_v4().to_string();
        let vote = self
            .db
            .record_vote(&vote_id, user_id, prediction_id, choice)
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => EngineError::DuplicateVote,
                // The prediction resolved between the check and the insert.
                DatabaseError::NotFound(_) => EngineError::AlreadyResolved,
                other => EngineError::Database(other),
            })?;

        info!(
            vote_id = %vote.id,
            user_id = %user_id,
            prediction_id = %prediction_id,
            choice = %choice,
            "Vote recorded"
        );

        let new_badges = match self.rewards.award_participation(user_id, &vote.id).await {
            Ok(badges) => badges,
            Err(e) => {
                // The vote stands; the keyed grant can be replayed later.
                warn!(user_id = %user_id, vote_id = %vote.id, error = %e,
                      "Participation bonus failed");
                Vec::new()
            }
        };

        self.mirror.record(MirrorEvent::VoteCast {
            vote_id: vote.id.clone(),
            prediction_id: prediction_id.to_string(),
            user_id: user_id.to_string(),
            choice: choice.as_str().to_string(),
        });

        Ok(CastOutcome {
            vote_id: vote.id,
            new_badges,
        })
    }

    /// The vote a user cast on a prediction, if any.
    pub async fn user_vote(
        &self,
        user_id: &str,
        prediction_id: &str,
    ) -> Result<Option<crate::storage::VoteRow>, EngineError> {
        Ok(self.db.get_user_vote(user_id, prediction_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::BadgeEngine;
    use crate::mirror::NoopMirror;
    use crowdcall_core::db::unix_timestamp;

    async fn setup() -> (Database, VoteLedger) {
        let db = Database::open_in_memory().await.unwrap();
        db.create_user("u1", None, None, None).await.unwrap();
        db.create_user("u2", None, None, None).await.unwrap();
        db.create_prediction("p1", "u1", "Will BTC close green?", None, unix_timestamp() + 3600, None)
            .await
            .unwrap();

        let rewards = RewardEngine::new(db.clone(), BadgeEngine::new(db.clone()));
        let ledger = VoteLedger::new(db.clone(), rewards, Arc::new(NoopMirror));
        (db, ledger)
    }

    #[tokio::test]
    async fn cast_vote_rewards_participation() {
        let (db, ledger) = setup().await;

        let outcome = ledger.cast_vote("u1", "p1", Choice::Yes).await.unwrap();
        assert!(!outcome.vote_id.is_empty());

        let user = db.get_user("u1").await.unwrap();
        assert_eq!(user.xp, 5);
        assert_eq!(user.total_predictions, 1);

        let p = db.get_prediction("p1").await.unwrap();
        assert_eq!((p.total_votes, p.yes_votes, p.no_votes), (1, 1, 0));

        // First XP event also grants the welcome badge.
        let ids: Vec<&str> = outcome.new_badges.iter().map(|b| b.badge_id.as_str()).collect();
        assert_eq!(ids, vec!["welcome"]);
    }

    #[tokio::test]
    async fn second_vote_is_duplicate() {
        let (db, ledger) = setup().await;

        ledger.cast_vote("u1", "p1", Choice::Yes).await.unwrap();
        let err = ledger.cast_vote("u1", "p1", Choice::No).await;
        assert!(matches!(err, Err(EngineError::DuplicateVote)));

        // No double reward either.
        let user = db.get_user("u1").await.unwrap();
        assert_eq!(user.xp, 5);
        assert_eq!(user.total_predictions, 1);
    }

    #[tokio::test]
    async fn vote_on_resolved_prediction_rejected() {
        let (db, ledger) = setup().await;
        db.mark_resolved("p1", Choice::Yes).await.unwrap();

        let err = ledger.cast_vote("u1", "p1", Choice::Yes).await;
        assert!(matches!(err, Err(EngineError::AlreadyResolved)));
    }

    #[tokio::test]
    async fn vote_on_missing_prediction_not_found() {
        let (_db, ledger) = setup().await;

        let err = ledger.cast_vote("u1", "nope", Choice::Yes).await;
        assert!(matches!(err, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn vote_by_missing_user_not_found() {
        let (_db, ledger) = setup().await;

        let err = ledger.cast_vote("ghost", "p1", Choice::Yes).await;
        assert!(matches!(err, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn n_votes_mean_n_counted_and_five_n_xp() {
        let (db, ledger) = setup().await;
        for i in 0..4 {
            db.create_prediction(
                &format!("extra{i}"),
                "u1",
                "More?",
                None,
                unix_timestamp() + 3600,
                None,
            )
            .await
            .unwrap();
            ledger
                .cast_vote("u2", &format!("extra{i}"), Choice::No)
                .await
                .unwrap();
        }

        let user = db.get_user("u2").await.unwrap();
        assert_eq!(user.total_predictions, 4);
        assert_eq!(user.xp, 20);
    }
}
