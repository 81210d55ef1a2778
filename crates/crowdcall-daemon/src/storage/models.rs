//! Database models for the Crowdcall daemon.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User record from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub provider_id: Option<String>,
    pub wallet_address: Option<String>,
    pub email: Option<String>,
    pub xp: i64,
    pub correct_predictions: i64,
    /// Counts votes cast, not predictions created. The historical field name
    /// is kept so stored data stays compatible with the original collections.
    pub total_predictions: i64,
    pub created_at: i64,
}

/// Prediction record from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PredictionRow {
    pub id: String,
    pub creator_id: String,
    pub question: String,
    pub description: Option<String>,
    pub end_date: i64,
    pub status: String,
    pub result: Option<String>,
    pub correct_answer: Option<String>,
    pub total_votes: i64,
    pub yes_votes: i64,
    pub no_votes: i64,
    pub created_at: i64,
}

impl PredictionRow {
    /// Whether the prediction is still open for votes and resolution.
    pub fn is_active(&self) -> bool {
        self.status == PredictionStatus::Active.as_str()
    }
}

/// Vote record from the database. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VoteRow {
    pub id: String,
    pub user_id: String,
    pub prediction_id: String,
    pub choice: String,
    pub created_at: i64,
}

/// Earned badge record from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserBadgeRow {
    pub user_id: String,
    pub badge_id: String,
    pub earned_at: i64,
    /// 1 until the client acknowledges the earn notification.
    pub is_new: i64,
}

/// A resolved prediction joined with the user's vote on it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserHistoryRow {
    pub prediction_id: String,
    pub question: String,
    pub description: Option<String>,
    pub end_date: i64,
    pub result: Option<String>,
    pub total_votes: i64,
    pub yes_votes: i64,
    pub no_votes: i64,
    pub user_choice: String,
    pub voted_at: i64,
}

/// One entry of a user's merged profile activity: either a vote they cast
/// or a prediction they created.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityRow {
    pub id: String,
    /// "vote" or "prediction".
    pub kind: String,
    pub prediction_id: String,
    pub question: String,
    pub status: String,
    pub result: Option<String>,
    /// The user's choice for vote entries; None for created predictions.
    pub choice: Option<String>,
    pub total_votes: i64,
    pub created_at: i64,
}

/// Prediction status enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStatus {
    Active,
    Resolved,
}

impl PredictionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A yes/no vote choice (also used for outcomes and declared answers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Yes,
    No,
}

impl Choice {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            other => Err(format!("invalid choice: {other:?} (expected \"yes\" or \"no\")")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_roundtrip() {
        assert_eq!("yes".parse::<Choice>(), Ok(Choice::Yes));
        assert_eq!("no".parse::<Choice>(), Ok(Choice::No));
        assert!("maybe".parse::<Choice>().is_err());
        assert_eq!(Choice::Yes.as_str(), "yes");
    }

    #[test]
    fn status_strings() {
        assert_eq!(PredictionStatus::Active.to_string(), "active");
        assert_eq!(PredictionStatus::Resolved.to_string(), "resolved");
    }
}
