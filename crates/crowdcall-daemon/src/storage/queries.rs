//! User, badge, and reward-grant queries for the Crowdcall daemon.

use crowdcall_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::models::{UserBadgeRow, UserRow};

impl Database {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Create a new user with zero counters.
    pub async fn create_user(
        &self,
        id: &str,
        provider_id: Option<&str>,
        wallet_address: Option<&str>,
        email: Option<&str>,
    ) -> Result<UserRow, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            r"
            INSERT INTO users (id, provider_id, wallet_address, email, created_at)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(id)
        .bind(provider_id)
        .bind(wallet_address)
        .bind(email)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_user(id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<UserRow, DatabaseError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    /// Look up a user by identity-provider reference.
    pub async fn get_user_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<UserRow>, DatabaseError> {
        let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE provider_id = ? LIMIT 1")
            .bind(provider_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(user)
    }

    /// Look up a user by email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>, DatabaseError> {
        let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ? LIMIT 1")
            .bind(email)
            .fetch_optional(self.pool())
            .await?;

        Ok(user)
    }

    /// Attach an identity-provider reference to an existing user.
    pub async fn link_provider(&self, id: &str, provider_id: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE users SET provider_id = ? WHERE id = ?")
            .bind(provider_id)
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {id}")));
        }
        Ok(())
    }

    /// Top users ordered by XP descending; ties broken by user id ascending
    /// so the ranking is deterministic.
    pub async fn list_top_users(&self, limit: u32) -> Result<Vec<UserRow>, DatabaseError> {
        let users =
            sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY xp DESC, id ASC LIMIT ?")
                .bind(limit)
                .fetch_all(self.pool())
                .await?;

        Ok(users)
    }

    // =========================================================================
    // Reward grant queries
    // =========================================================================

    /// Apply an XP grant exactly once, keyed by `grant_key`.
    ///
    /// Inserts the grant key and applies the counter deltas in a single
    /// transaction. Returns `false` without touching the user when the key
    /// was already applied, so retries after partial failure are safe.
    pub async fn apply_reward_grant(
        &self,
        grant_key: &str,
        user_id: &str,
        xp_delta: i64,
        correct_delta: i64,
        votes_delta: i64,
    ) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        // The grant key row references users(id), so verify the user inside
        // the transaction and fail with NotFound before the FK can trip.
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            tx.rollback().await?;
            return Err(DatabaseError::NotFound(format!("User {user_id}")));
        }

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO reward_grants (grant_key, user_id, amount, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(grant_key)
        .bind(user_id)
        .bind(xp_delta)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE users SET xp = xp + ?, correct_predictions = correct_predictions + ?, total_predictions = total_predictions + ? WHERE id = ?",
        )
        .bind(xp_delta)
        .bind(correct_delta)
        .bind(votes_delta)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    // =========================================================================
    // Badge queries
    // =========================================================================

    /// Grant a badge if the user does not already hold it.
    ///
    /// Returns `true` when the row was inserted. The (`user_id`, `badge_id`)
    /// primary key makes concurrent evaluations grant at most once.
    pub async fn try_grant_badge(
        &self,
        user_id: &str,
        badge_id: &str,
    ) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT OR IGNORE INTO user_badges (user_id, badge_id, earned_at, is_new) VALUES (?, ?, ?, 1)",
        )
        .bind(user_id)
        .bind(badge_id)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Badges held by a user, most recently earned first.
    pub async fn list_user_badges(&self, user_id: &str) -> Result<Vec<UserBadgeRow>, DatabaseError> {
        let badges = sqlx::query_as::<_, UserBadgeRow>(
            "SELECT * FROM user_badges WHERE user_id = ? ORDER BY earned_at DESC, badge_id ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(badges)
    }

    /// Ids of badges held by a user.
    pub async fn list_user_badge_ids(&self, user_id: &str) -> Result<Vec<String>, DatabaseError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT badge_id FROM user_badges WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(ids)
    }

    /// Get a single earned badge.
    pub async fn get_user_badge(
        &self,
        user_id: &str,
        badge_id: &str,
    ) -> Result<Option<UserBadgeRow>, DatabaseError> {
        let badge = sqlx::query_as::<_, UserBadgeRow>(
            "SELECT * FROM user_badges WHERE user_id = ? AND badge_id = ?",
        )
        .bind(user_id)
        .bind(badge_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(badge)
    }

    /// Clear the "new" notification flag on an earned badge.
    /// Returns `false` when the user does not hold the badge.
    pub async fn mark_badge_viewed(
        &self,
        user_id: &str,
        badge_id: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE user_badges SET is_new = 0 WHERE user_id = ? AND badge_id = ?",
        )
        .bind(user_id)
        .bind(badge_id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
