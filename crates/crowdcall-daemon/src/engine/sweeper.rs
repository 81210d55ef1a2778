//! Expiration sweeper.
//!
//! A single server-owned periodic task finds active predictions past their
//! end time and auto-resolves those with a pre-declared correct answer.
//! Predictions without one stay active until an admin resolves them; only a
//! human may determine an outcome that was not declared in advance.

use std::str::FromStr;

use tracing::{info, warn};

use super::lifecycle::LifecycleManager;
use super::EngineError;
use crate::storage::{Choice, Database};

/// Finds and auto-resolves expired predictions.
#[derive(Clone)]
pub struct Sweeper {
    db: Database,
    lifecycle: LifecycleManager,
}

impl Sweeper {
    pub const fn new(db: Database, lifecycle: LifecycleManager) -> Self {
        Self { db, lifecycle }
    }

    /// Run one sweep at the given time. Returns the number auto-resolved.
    ///
    /// Each prediction is handled independently: one failure is logged and
    /// the sweep moves on. Losing the resolution race to an admin counts as
    /// already handled, not as a failure.
    pub async fn sweep(&self, now: i64) -> Result<u64, EngineError> {
        let expired = self.db.list_expired_active(now).await?;
        let mut resolved = 0u64;

        for prediction in expired {
            let Some(answer) = prediction.correct_answer.as_deref() else {
                // Overdue but no declared answer: awaiting manual resolution.
                continue;
            };

            let result = match Choice::from_str(answer) {
                Ok(result) => result,
                Err(e) => {
                    warn!(prediction_id = %prediction.id, error = %e,
                          "Skipping prediction with malformed declared answer");
                    continue;
                }
            };

            match self.lifecycle.resolve(&prediction.id, result).await {
                Ok(_) => {
                    info!(prediction_id = %prediction.id, result = %result,
                          "Auto-resolved expired prediction");
                    resolved += 1;
                }
                Err(EngineError::AlreadyResolved) => {}
                Err(e) => {
                    warn!(prediction_id = %prediction.id, error = %e,
                          "Auto-resolution failed; continuing sweep");
                }
            }
        }

        Ok(resolved)
    }
}

/// Spawn the periodic sweep task.
///
/// Ticks are processed one at a time on a single task, so overlapping
/// sweeps cannot run; a tick that takes longer than the interval simply
/// delays the next one.
pub fn spawn_sweeper(
    sweeper: Sweeper,
    interval: std::time::Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        timer.tick().await; // Skip first immediate tick

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let now = crowdcall_core::db::unix_timestamp();
                    match sweeper.sweep(now).await {
                        Ok(0) => {}
                        Ok(resolved) => {
                            info!(resolved, "Sweep pass complete");
                        }
                        Err(e) => {
                            warn!(error = %e, "Sweep pass failed");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("Sweeper shutting down");
                    return;
                }
            }
        }
    })
}
