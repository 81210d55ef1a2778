//! Prediction and vote queries for the Crowdcall daemon.

use crowdcall_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::models::{ActivityRow, Choice, PredictionRow, UserHistoryRow, VoteRow};

impl Database {
    // =========================================================================
    // Prediction queries
    // =========================================================================

    /// Insert a new prediction in the active state with zero tallies.
    pub async fn create_prediction(
        &self,
        id: &str,
        creator_id: &str,
        question: &str,
        description: Option<&str>,
        end_date: i64,
        correct_answer: Option<Choice>,
    ) -> Result<PredictionRow, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            r"
            INSERT INTO predictions (id, creator_id, question, description, end_date, correct_answer, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id)
        .bind(creator_id)
        .bind(question)
        .bind(description)
        .bind(end_date)
        .bind(correct_answer.map(Choice::as_str))
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_prediction(id).await
    }

    /// Get a prediction by ID.
    pub async fn get_prediction(&self, id: &str) -> Result<PredictionRow, DatabaseError> {
        sqlx::query_as::<_, PredictionRow>("SELECT * FROM predictions WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Prediction {id}")))
    }

    /// Predictions still open for voting, newest first.
    pub async fn list_active_predictions(&self) -> Result<Vec<PredictionRow>, DatabaseError> {
        let predictions = sqlx::query_as::<_, PredictionRow>(
            "SELECT * FROM predictions WHERE status = 'active' ORDER BY created_at DESC",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(predictions)
    }

    /// Active predictions whose end date has passed, for the sweeper.
    pub async fn list_expired_active(&self, now: i64) -> Result<Vec<PredictionRow>, DatabaseError> {
        let predictions = sqlx::query_as::<_, PredictionRow>(
            "SELECT * FROM predictions WHERE status = 'active' AND end_date <= ? ORDER BY end_date ASC",
        )
        .bind(now)
        .fetch_all(self.pool())
        .await?;

        Ok(predictions)
    }

    /// Transition a prediction from active to resolved.
    ///
    /// The conditional UPDATE is the atomic gate for resolution: the first
    /// writer wins and `true` is returned; a concurrent or repeated attempt
    /// affects zero rows and returns `false`, so no reward side effect can
    /// run twice.
    pub async fn mark_resolved(&self, id: &str, result: Choice) -> Result<bool, DatabaseError> {
        let updated = sqlx::query(
            "UPDATE predictions SET status = 'resolved', result = ? WHERE id = ? AND status = 'active'",
        )
        .bind(result.as_str())
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(updated.rows_affected() > 0)
    }

    // =========================================================================
    // Vote queries
    // =========================================================================

    /// Record a vote and bump the prediction tallies in one transaction.
    ///
    /// The tally update re-validates `status = 'active'` while holding the
    /// write, so a vote can never land on a resolved prediction; the unique
    /// (`user_id`, `prediction_id`) index rejects duplicates. Tallies use
    /// atomic `col = col + 1` increments, never read-modify-write.
    ///
    /// Errors: `Conflict` for a duplicate vote, `NotFound` when the
    /// prediction is missing or no longer active.
    pub async fn record_vote(
        &self,
        vote_id: &str,
        user_id: &str,
        prediction_id: &str,
        choice: Choice,
    ) -> Result<VoteRow, DatabaseError> {
        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "INSERT INTO votes (id, user_id, prediction_id, choice, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(vote_id)
        .bind(user_id)
        .bind(prediction_id)
        .bind(choice.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            r"
            UPDATE predictions SET
                total_votes = total_votes + 1,
                yes_votes = yes_votes + (CASE WHEN ?1 = 'yes' THEN 1 ELSE 0 END),
                no_votes = no_votes + (CASE WHEN ?1 = 'no' THEN 1 ELSE 0 END)
            WHERE id = ?2 AND status = 'active'
            ",
        )
        .bind(choice.as_str())
        .bind(prediction_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DatabaseError::NotFound(format!(
                "Active prediction {prediction_id}"
            )));
        }

        tx.commit().await?;
        self.get_vote(vote_id).await
    }

    /// Get a vote by ID.
    pub async fn get_vote(&self, id: &str) -> Result<VoteRow, DatabaseError> {
        sqlx::query_as::<_, VoteRow>("SELECT * FROM votes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Vote {id}")))
    }

    /// The vote a user cast on a prediction, if any.
    pub async fn get_user_vote(
        &self,
        user_id: &str,
        prediction_id: &str,
    ) -> Result<Option<VoteRow>, DatabaseError> {
        let vote = sqlx::query_as::<_, VoteRow>(
            "SELECT * FROM votes WHERE user_id = ? AND prediction_id = ?",
        )
        .bind(user_id)
        .bind(prediction_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(vote)
    }

    /// Votes on a prediction matching a choice, for correctness fan-out.
    pub async fn list_votes_by_choice(
        &self,
        prediction_id: &str,
        choice: Choice,
    ) -> Result<Vec<VoteRow>, DatabaseError> {
        let votes = sqlx::query_as::<_, VoteRow>(
            "SELECT * FROM votes WHERE prediction_id = ? AND choice = ? ORDER BY created_at ASC",
        )
        .bind(prediction_id)
        .bind(choice.as_str())
        .fetch_all(self.pool())
        .await?;

        Ok(votes)
    }

    /// Resolved predictions the user voted on, newest vote first.
    pub async fn list_user_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserHistoryRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, UserHistoryRow>(
            r"
            SELECT
                p.id AS prediction_id,
                p.question,
                p.description,
                p.end_date,
                p.result,
                p.total_votes,
                p.yes_votes,
                p.no_votes,
                v.choice AS user_choice,
                v.created_at AS voted_at
            FROM votes v
            JOIN predictions p ON p.id = v.prediction_id
            WHERE v.user_id = ? AND p.status = 'resolved'
            ORDER BY v.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    /// A user's recent profile activity: votes cast and predictions created,
    /// merged and ordered newest first.
    pub async fn list_user_activities(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r"
            SELECT v.id AS id, 'vote' AS kind, p.id AS prediction_id,
                   p.question, p.status, p.result, v.choice AS choice,
                   p.total_votes, v.created_at AS created_at
            FROM votes v
            JOIN predictions p ON p.id = v.prediction_id
            WHERE v.user_id = ?1
            UNION ALL
            SELECT p.id, 'prediction', p.id,
                   p.question, p.status, p.result, NULL,
                   p.total_votes, p.created_at
            FROM predictions p
            WHERE p.creator_id = ?1
            ORDER BY created_at DESC, id ASC
            LIMIT ?2
            ",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }
}
