//! Prediction lifecycle manager.
//!
//! A prediction has exactly two states: `active` (initial) and `resolved`
//! (terminal). The active-to-resolved transition is a conditional UPDATE in
//! storage; it is the atomic gate in front of every reward side effect, so
//! a racing sweeper and admin cannot both distribute bonuses.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::rewards::RewardEngine;
use super::EngineError;
use crate::mirror::{LedgerMirror, MirrorEvent};
use crate::storage::{Choice, Database, PredictionRow, UserBadgeRow};

/// A voter who received the correctness bonus during a resolution.
#[derive(Debug, Clone)]
pub struct RewardedVoter {
    pub user_id: String,
    pub new_badges: Vec<UserBadgeRow>,
}

/// Result of a resolution, including the reward fan-out for notifications.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub prediction: PredictionRow,
    pub rewarded: Vec<RewardedVoter>,
}

/// Owns prediction creation and terminal resolution.
#[derive(Clone)]
pub struct LifecycleManager {
    db: Database,
    rewards: RewardEngine,
    mirror: Arc<dyn LedgerMirror>,
}

impl LifecycleManager {
    pub fn new(db: Database, rewards: RewardEngine, mirror: Arc<dyn LedgerMirror>) -> Self {
        Self {
            db,
            rewards,
            mirror,
        }
    }

    /// Create a prediction in the active state with zero tallies.
    ///
    /// Fails with `InvalidInput` when the question is empty or the end date
    /// is not in the future.
    pub async fn create(
        &self,
        creator_id: &str,
        question: &str,
        description: Option<&str>,
        end_date: i64,
        correct_answer: Option<Choice>,
    ) -> Result<PredictionRow, EngineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(EngineError::InvalidInput("question must not be empty".into()));
        }
        if end_date <= crowdcall_core::db::unix_timestamp() {
            return Err(EngineError::InvalidInput(
                "end date must be in the future".into(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let prediction = self
            .db
            .create_prediction(&id, creator_id, question, description, end_date, correct_answer)
            .await?;

        info!(
            prediction_id = %prediction.id,
            creator_id = %creator_id,
            auto_resolvable = correct_answer.is_some(),
            "Prediction created"
        );

        self.mirror.record(MirrorEvent::PredictionCreated {
            prediction_id: prediction.id.clone(),
            creator_id: creator_id.to_string(),
            question: question.to_string(),
            end_date,
        });

        Ok(prediction)
    }

    /// Resolve a prediction, terminally, and distribute correctness bonuses.
    ///
    /// Fails with `NotFound` for an unknown prediction and `AlreadyResolved`
    /// when the transition already happened; in either case no reward side
    /// effect occurs. A failure granting one user's bonus is logged and does
    /// not stop the rest, and never rolls back the resolution itself.
    pub async fn resolve(
        &self,
        prediction_id: &str,
        result: Choice,
    ) -> Result<ResolutionOutcome, EngineError> {
        // Distinguish missing from already-resolved before taking the gate.
        self.db.get_prediction(prediction_id).await?;

        if !self.db.mark_resolved(prediction_id, result).await? {
            return Err(EngineError::AlreadyResolved);
        }

        let correct_votes = self.db.list_votes_by_choice(prediction_id, result).await?;

        info!(
            prediction_id = %prediction_id,
            result = %result,
            correct_voters = correct_votes.len(),
            "Prediction resolved"
        );

        let mut rewarded = Vec::new();
        for vote in correct_votes {
            match self
                .rewards
                .award_correctness(&vote.user_id, prediction_id)
                .await
            {
                Ok(new_badges) => rewarded.push(RewardedVoter {
                    user_id: vote.user_id,
                    new_badges,
                }),
                Err(e) => {
                    warn!(
                        user_id = %vote.user_id,
                        prediction_id = %prediction_id,
                        error = %e,
                        "Correctness bonus failed; continuing with remaining voters"
                    );
                }
            }
        }

        self.mirror.record(MirrorEvent::PredictionResolved {
            prediction_id: prediction_id.to_string(),
            result: result.as_str().to_string(),
            rewarded_voters: rewarded.len(),
        });

        let prediction = self.db.get_prediction(prediction_id).await?;
        Ok(ResolutionOutcome {
            prediction,
            rewarded,
        })
    }

    /// Fetch a single prediction.
    pub async fn get(&self, prediction_id: &str) -> Result<PredictionRow, EngineError> {
        Ok(self.db.get_prediction(prediction_id).await?)
    }

    /// Predictions still open for voting, newest first. Past-due entries
    /// without a declared answer stay in this list until an admin resolves
    /// them; they are recognizable by their end date.
    pub async fn list_active(&self) -> Result<Vec<PredictionRow>, EngineError> {
        Ok(self.db.list_active_predictions().await?)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::{BadgeEngine, VoteLedger};
    use crate::mirror::NoopMirror;
    use crowdcall_core::db::unix_timestamp;

    async fn setup() -> (Database, LifecycleManager, VoteLedger) {
        let db = Database::open_in_memory().await.unwrap();
        db.create_user("creator", None, None, None).await.unwrap();
        db.create_user("yes-voter", None, None, None).await.unwrap();
        db.create_user("no-voter", None, None, None).await.unwrap();

        let rewards = RewardEngine::new(db.clone(), BadgeEngine::new(db.clone()));
        let mirror: Arc<dyn LedgerMirror> = Arc::new(NoopMirror);
        let lifecycle = LifecycleManager::new(db.clone(), rewards.clone(), Arc::clone(&mirror));
        let ledger = VoteLedger::new(db.clone(), rewards, mirror);
        (db, lifecycle, ledger)
    }

    #[tokio::test]
    async fn create_validates_input() {
        let (_db, lifecycle, _ledger) = setup().await;
        let future = unix_timestamp() + 3600;

        let err = lifecycle.create("creator", "   ", None, future, None).await;
        assert!(matches!(err, Err(EngineError::InvalidInput(_))));

        let err = lifecycle
            .create("creator", "Too late?", None, unix_timestamp() - 1, None)
            .await;
        assert!(matches!(err, Err(EngineError::InvalidInput(_))));

        let p = lifecycle
            .create("creator", "Will it work?", Some("details"), future, None)
            .await
            .unwrap();
        assert!(p.is_active());
        assert_eq!(p.total_votes, 0);
    }

    #[tokio::test]
    async fn resolution_rewards_only_correct_voters() {
        let (db, lifecycle, ledger) = setup().await;
        let p = lifecycle
            .create("creator", "Green close?", None, unix_timestamp() + 3600, None)
            .await
            .unwrap();

        ledger.cast_vote("yes-voter", &p.id, Choice::Yes).await.unwrap();
        ledger.cast_vote("no-voter", &p.id, Choice::No).await.unwrap();

        let outcome = lifecycle.resolve(&p.id, Choice::Yes).await.unwrap();
        assert_eq!(outcome.prediction.result.as_deref(), Some("yes"));
        assert_eq!(outcome.rewarded.len(), 1);
        assert_eq!(outcome.rewarded[0].user_id, "yes-voter");

        // 5 participation + 10 correctness for the winner, 5 for the loser.
        let winner = db.get_user("yes-voter").await.unwrap();
        assert_eq!(winner.xp, 15);
        assert_eq!(winner.correct_predictions, 1);

        let loser = db.get_user("no-voter").await.unwrap();
        assert_eq!(loser.xp, 5);
        assert_eq!(loser.correct_predictions, 0);
    }

    #[tokio::test]
    async fn second_resolution_rejected_without_side_effects() {
        let (db, lifecycle, ledger) = setup().await;
        let p = lifecycle
            .create("creator", "Once only?", None, unix_timestamp() + 3600, None)
            .await
            .unwrap();
        ledger.cast_vote("yes-voter", &p.id, Choice::Yes).await.unwrap();

        lifecycle.resolve(&p.id, Choice::Yes).await.unwrap();
        let xp_after_first = db.get_user("yes-voter").await.unwrap().xp;

        let err = lifecycle.resolve(&p.id, Choice::Yes).await;
        assert!(matches!(err, Err(EngineError::AlreadyResolved)));

        // Result unchanged across a conflicting second attempt too.
        let err = lifecycle.resolve(&p.id, Choice::No).await;
        assert!(matches!(err, Err(EngineError::AlreadyResolved)));

        assert_eq!(db.get_user("yes-voter").await.unwrap().xp, xp_after_first);
        let p = db.get_prediction(&p.id).await.unwrap();
        assert_eq!(p.result.as_deref(), Some("yes"));
    }

    #[tokio::test]
    async fn resolving_missing_prediction_not_found() {
        let (_db, lifecycle, _ledger) = setup().await;

        let err = lifecycle.resolve("nope", Choice::Yes).await;
        assert!(matches!(err, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn active_list_excludes_resolved() {
        let (_db, lifecycle, _ledger) = setup().await;
        let keep = lifecycle
            .create("creator", "Stays?", None, unix_timestamp() + 3600, None)
            .await
            .unwrap();
        let done = lifecycle
            .create("creator", "Goes?", None, unix_timestamp() + 3600, None)
            .await
            .unwrap();
        lifecycle.resolve(&done.id, Choice::No).await.unwrap();

        let active = lifecycle.list_active().await.unwrap();
        let ids: Vec<&str> = active.iter().map(|p| p.id.as_str()).collect();
        assert!(ids.contains(&keep.id.as_str()));
        assert!(!ids.contains(&done.id.as_str()));
    }
}
