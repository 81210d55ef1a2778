//! Leaderboard aggregator: ranked XP view derived on read.

use super::EngineError;
use crate::storage::Database;

/// One row of the leaderboard. Nothing here is persisted.
#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub xp: i64,
    pub correct_predictions: i64,
    pub total_predictions: i64,
    /// round(100 * correct / total); 0 when the user has no votes.
    pub success_rate: u32,
}

#[derive(Clone)]
pub struct Leaderboard {
    db: Database,
}

impl Leaderboard {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Up to `limit` users ordered by XP descending, ties broken by user id
    /// so repeated reads return the same ranking.
    pub async fn top(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, EngineError> {
        let users = self.db.list_top_users(limit).await?;

        Ok(users
            .into_iter()
            .map(|u| LeaderboardEntry {
                success_rate: success_rate(u.correct_predictions, u.total_predictions),
                user_id: u.id,
                xp: u.xp,
                correct_predictions: u.correct_predictions,
                total_predictions: u.total_predictions,
            })
            .collect())
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn success_rate(correct: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    (correct as f64 / total as f64 * 100.0).round() as u32
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_rounds() {
        assert_eq!(success_rate(0, 0), 0);
        assert_eq!(success_rate(1, 3), 33);
        assert_eq!(success_rate(2, 3), 67);
        assert_eq!(success_rate(3, 3), 100);
    }

    #[tokio::test]
    async fn top_orders_by_xp_then_id() {
        let db = Database::open_in_memory().await.unwrap();
        for id in ["beta", "alpha", "gamma"] {
            db.create_user(id, None, None, None).await.unwrap();
        }
        db.apply_reward_grant("k:alpha", "alpha", 300, 2, 4).await.unwrap();
        db.apply_reward_grant("k:beta", "beta", 300, 1, 2).await.unwrap();
        db.apply_reward_grant("k:gamma", "gamma", 50, 0, 0).await.unwrap();

        let board = Leaderboard::new(db);
        let entries = board.top(10).await.unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "beta", "gamma"]);
        assert_eq!(entries[0].success_rate, 50);
        assert_eq!(entries[2].success_rate, 0);
    }

    #[tokio::test]
    async fn limit_truncates() {
        let db = Database::open_in_memory().await.unwrap();
        for i in 0..5 {
            db.create_user(&format!("u{i}"), None, None, None).await.unwrap();
        }

        let board = Leaderboard::new(db);
        assert_eq!(board.top(3).await.unwrap().len(), 3);
    }
}
