//! Domain engines for the Crowdcall daemon.
//!
//! Each engine owns one concern of the prediction lifecycle:
//! - [`LifecycleManager`] -- creation and terminal resolution
//! - [`VoteLedger`] -- one vote per (user, prediction), tally upkeep
//! - [`RewardEngine`] -- exactly-once XP grants
//! - [`BadgeEngine`] -- threshold evaluation against the badge catalog
//! - [`Sweeper`] -- periodic auto-resolution of expired predictions
//! - [`Leaderboard`] -- derived XP ranking

mod badges;
mod leaderboard;
mod lifecycle;
mod rewards;
mod sweeper;
mod votes;

pub use badges::{BadgeEngine, BadgeProgress};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use lifecycle::{LifecycleManager, ResolutionOutcome, RewardedVoter};
pub use rewards::{RewardEngine, CORRECTNESS_XP, PARTICIPATION_XP};
pub use sweeper::{spawn_sweeper, Sweeper};
pub use votes::{CastOutcome, VoteLedger};

use thiserror::Error;

use crate::storage::DatabaseError;

/// Domain errors surfaced to callers of the engines.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("vote already cast for this prediction")]
    DuplicateVote,

    #[error("prediction is already resolved")]
    AlreadyResolved,

    /// Transient failure applying one user's XP or badges. Resolution-level
    /// callers log these per user and keep going.
    #[error("reward application failed for user {user_id}: {reason}")]
    RewardApplication { user_id: String, reason: String },

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for EngineError {
    fn from(e: DatabaseError) -> Self {
        // A missing row is a domain outcome, not a storage fault.
        match e {
            DatabaseError::NotFound(what) => Self::NotFound(what),
            other => Self::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_row_converts_to_domain_not_found() {
        let err = EngineError::from(DatabaseError::NotFound("Prediction ghost".into()));
        assert!(matches!(err, EngineError::NotFound(_)));

        let err = EngineError::from(DatabaseError::Query("disk I/O error".into()));
        assert!(matches!(err, EngineError::Database(_)));
    }
}
