#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! Integration test for the expiration sweeper.
//!
//! Expired predictions with a pre-declared answer are auto-resolved and
//! their voters rewarded exactly as with a manual resolution. Expired
//! predictions without a declared answer stay open for manual resolution.

use std::sync::Arc;
use std::time::Duration;

use crowdcall_core::db::unix_timestamp;
use crowdcall_daemon::engine::{
    spawn_sweeper, BadgeEngine, LifecycleManager, RewardEngine, Sweeper, VoteLedger,
};
use crowdcall_daemon::mirror::{LedgerMirror, NoopMirror};
use crowdcall_daemon::storage::{Choice, Database, PredictionStatus};

struct Harness {
    db: Database,
    votes: VoteLedger,
    sweeper: Sweeper,
}

async fn setup() -> Harness {
    let db = Database::open_in_memory().await.unwrap();
    let mirror: Arc<dyn LedgerMirror> = Arc::new(NoopMirror);

    let badges = BadgeEngine::new(db.clone());
    let rewards = RewardEngine::new(db.clone(), badges);
    let lifecycle = LifecycleManager::new(db.clone(), rewards.clone(), Arc::clone(&mirror));
    let votes = VoteLedger::new(db.clone(), rewards, mirror);
    let sweeper = Sweeper::new(db.clone(), lifecycle);

    Harness { db, votes, sweeper }
}

#[tokio::test]
async fn test_sweep_resolves_expired_and_rewards_voters() {
    let h = setup().await;
    let now = unix_timestamp();

    h.db.create_user("creator", None, None, None).await.unwrap();
    h.db.create_user("yes-voter", None, None, None).await.unwrap();
    h.db.create_user("no-voter", None, None, None).await.unwrap();

    // Already past its end date, answer declared up front.
    h.db.create_prediction(
        "expired",
        "creator",
        "Did the launch happen?",
        None,
        now - 60,
        Some(Choice::Yes),
    )
    .await
    .unwrap();

    // Votes land before expiry in the real timeline; status is still
    // active here so the ledger accepts them.
    h.votes.cast_vote("yes-voter", "expired", Choice::Yes).await.unwrap();
    h.votes.cast_vote("no-voter", "expired", Choice::No).await.unwrap();

    let resolved = h.sweeper.sweep(now).await.unwrap();
    assert_eq!(resolved, 1);

    let prediction = h.db.get_prediction("expired").await.unwrap();
    assert_eq!(prediction.status, PredictionStatus::Resolved.as_str());
    assert_eq!(prediction.result.as_deref(), Some("yes"));

    // Correct voter gets participation plus the correctness bonus.
    let winner = h.db.get_user("yes-voter").await.unwrap();
    assert_eq!(winner.xp, 15);
    assert_eq!(winner.correct_predictions, 1);

    let loser = h.db.get_user("no-voter").await.unwrap();
    assert_eq!(loser.xp, 5);
    assert_eq!(loser.correct_predictions, 0);
}

#[tokio::test]
async fn test_sweep_leaves_undeclared_predictions_active() {
    let h = setup().await;
    let now = unix_timestamp();

    h.db.create_user("creator", None, None, None).await.unwrap();
    h.db.create_prediction("no-answer", "creator", "Who knows?", None, now - 60, None)
        .await
        .unwrap();

    let resolved = h.sweeper.sweep(now).await.unwrap();
    assert_eq!(resolved, 0);

    let prediction = h.db.get_prediction("no-answer").await.unwrap();
    assert_eq!(prediction.status, PredictionStatus::Active.as_str());
    assert!(prediction.result.is_none());
}

#[tokio::test]
async fn test_sweep_is_idempotent() {
    let h = setup().await;
    let now = unix_timestamp();

    h.db.create_user("creator", None, None, None).await.unwrap();
    h.db.create_user("voter", None, None, None).await.unwrap();
    h.db.create_prediction("once", "creator", "Once only?", None, now - 60, Some(Choice::No))
        .await
        .unwrap();
    h.votes.cast_vote("voter", "once", Choice::No).await.unwrap();

    assert_eq!(h.sweeper.sweep(now).await.unwrap(), 1);
    assert_eq!(h.sweeper.sweep(now).await.unwrap(), 0);

    // The correctness bonus was granted exactly once.
    let voter = h.db.get_user("voter").await.unwrap();
    assert_eq!(voter.xp, 15);
    assert_eq!(voter.correct_predictions, 1);
}

#[tokio::test]
async fn test_background_sweeper_task_runs_and_shuts_down() {
    let h = setup().await;
    let now = unix_timestamp();

    h.db.create_user("creator", None, None, None).await.unwrap();
    h.db.create_prediction("bg", "creator", "Swept in background?", None, now - 60, Some(Choice::Yes))
        .await
        .unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let handle = spawn_sweeper(h.sweeper, Duration::from_millis(20), shutdown_rx);

    // Wait for at least one tick to fire.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let prediction = h.db.get_prediction("bg").await.unwrap();
    assert_eq!(prediction.status, PredictionStatus::Resolved.as_str());

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("sweeper should stop after shutdown signal")
        .unwrap();
}
