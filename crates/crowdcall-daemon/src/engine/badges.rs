//! Badge awarding engine.

use crowdcall_core::badges::{self, Badge};
use tracing::info;

use super::EngineError;
use crate::storage::{Database, UserBadgeRow};

/// Progress toward the next XP badge, for profile display.
#[derive(Debug, Clone)]
pub struct BadgeProgress {
    pub current_xp: i64,
    pub next_badge: Option<&'static Badge>,
    pub progress_percent: f64,
}

/// Evaluates the static badge catalog against a user's XP and grants
/// anything newly unlocked. Grants are append-only; nothing is ever revoked.
#[derive(Clone)]
pub struct BadgeEngine {
    db: Database,
}

impl BadgeEngine {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Grant every badge the user has unlocked but does not hold yet.
    ///
    /// The welcome badge is granted on the first evaluation regardless of
    /// XP. XP badges are checked in ascending threshold order, so a single
    /// large XP jump grants each crossed threshold in order. Returns only
    /// the badges actually inserted by this call.
    pub async fn check_and_award(
        &self,
        user_id: &str,
        current_xp: i64,
    ) -> Result<Vec<UserBadgeRow>, EngineError> {
        let mut granted = Vec::new();

        if self.db.try_grant_badge(user_id, "welcome").await? {
            granted.push(self.fetch_granted(user_id, "welcome").await?);
        }

        for badge in badges::xp_badges() {
            if badge.xp_required > current_xp {
                break;
            }
            if self.db.try_grant_badge(user_id, badge.id).await? {
                granted.push(self.fetch_granted(user_id, badge.id).await?);
            }
        }

        if !granted.is_empty() {
            info!(
                user_id = %user_id,
                xp = current_xp,
                badges = granted.len(),
                "Badges granted"
            );
        }

        Ok(granted)
    }

    /// Badges held by a user, most recently earned first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<UserBadgeRow>, EngineError> {
        Ok(self.db.list_user_badges(user_id).await?)
    }

    /// Clear the "new" notification flag on an earned badge.
    pub async fn mark_viewed(&self, user_id: &str, badge_id: &str) -> Result<bool, EngineError> {
        Ok(self.db.mark_badge_viewed(user_id, badge_id).await?)
    }

    /// Progress toward the next unearned XP badge.
    pub async fn progress(&self, user_id: &str) -> Result<BadgeProgress, EngineError> {
        let user = self.db.get_user(user_id).await?;
        let held = self.db.list_user_badge_ids(user_id).await?;
        let next_badge = badges::next_xp_badge(&held);

        Ok(BadgeProgress {
            current_xp: user.xp,
            next_badge,
            progress_percent: badges::progress_percent(user.xp, next_badge),
        })
    }

    async fn fetch_granted(
        &self,
        user_id: &str,
        badge_id: &str,
    ) -> Result<UserBadgeRow, EngineError> {
        self.db
            .get_user_badge(user_id, badge_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Badge {badge_id}")))
    }
}
