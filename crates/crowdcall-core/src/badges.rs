//! Static badge catalog.
//!
//! Badges are fixed configuration data, not runtime state: the storage layer
//! only records which catalog entries a user has earned. The welcome badge is
//! granted on first evaluation independent of XP; the remaining badges unlock
//! at XP thresholds.

use serde::{Deserialize, Serialize};

/// How a badge is unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeKind {
    /// Granted once on the first badge evaluation for a user.
    Welcome,
    /// Granted when the user's XP reaches `xp_required`.
    Xp,
    /// Reserved for activity-based badges.
    Activity,
    /// Reserved for one-off achievements.
    Achievement,
}

/// Badge rarity tier, used by clients for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

/// A catalog badge definition.
#[derive(Debug, Clone, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub image_path: &'static str,
    pub xp_required: i64,
    pub kind: BadgeKind,
    pub rarity: Rarity,
}

/// The fixed badge catalog, ordered ascending by `xp_required`.
pub const CATALOG: &[Badge] = &[
    Badge {
        id: "welcome",
        name: "Welcome!",
        description: "Welcome to the platform for the first time! \
                      You've stepped into the world of predictions.",
        image_path: "/welcome-badge.svg",
        xp_required: 0,
        kind: BadgeKind::Welcome,
        rarity: Rarity::Common,
    },
    Badge {
        id: "great_start",
        name: "Great Start",
        description: "You're doing great. Keep it up!",
        image_path: "/badge2.svg",
        xp_required: 50,
        kind: BadgeKind::Xp,
        rarity: Rarity::Rare,
    },
    Badge {
        id: "pushing_harder",
        name: "Pushing Harder",
        description: "You're pushing harder. Let's reach 500XP!",
        image_path: "/badge3.svg",
        xp_required: 100,
        kind: BadgeKind::Xp,
        rarity: Rarity::Epic,
    },
    Badge {
        id: "nirvana",
        name: "Nirvana",
        description: "You've reached the Nirvana level! You're a prediction master.",
        image_path: "/badge4.svg",
        xp_required: 500,
        kind: BadgeKind::Xp,
        rarity: Rarity::Legendary,
    },
];

/// Look up a catalog badge by id.
pub fn by_id(badge_id: &str) -> Option<&'static Badge> {
    CATALOG.iter().find(|b| b.id == badge_id)
}

/// XP-threshold badges in ascending `xp_required` order.
///
/// The catalog constant is already sorted; this filters out the welcome
/// badge, which is not XP-gated.
pub fn xp_badges() -> impl Iterator<Item = &'static Badge> {
    CATALOG.iter().filter(|b| b.kind == BadgeKind::Xp)
}

/// The next XP badge a user has not earned yet, given the set of held ids.
pub fn next_xp_badge(held: &[String]) -> Option<&'static Badge> {
    xp_badges().find(|b| !held.iter().any(|h| h == b.id))
}

/// Percent progress toward `next`, measured from the previous threshold.
///
/// Returns 100.0 when every XP badge is held (no `next`).
#[allow(clippy::cast_precision_loss)]
pub fn progress_percent(current_xp: i64, next: Option<&Badge>) -> f64 {
    let Some(next) = next else { return 100.0 };
    let previous = xp_badges()
        .filter(|b| b.xp_required < next.xp_required)
        .map(|b| b.xp_required)
        .max()
        .unwrap_or(0);
    let span = (next.xp_required - previous) as f64;
    let gained = (current_xp - previous) as f64;
    (gained / span * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn catalog_sorted_by_threshold() {
        let thresholds: Vec<i64> = CATALOG.iter().map(|b| b.xp_required).collect();
        let mut sorted = thresholds.clone();
        sorted.sort_unstable();
        assert_eq!(thresholds, sorted);
    }

    #[test]
    fn welcome_is_not_xp_gated() {
        let welcome = by_id("welcome").expect("welcome badge in catalog");
        assert_eq!(welcome.kind, BadgeKind::Welcome);
        assert!(xp_badges().all(|b| b.id != "welcome"));
    }

    #[test]
    fn next_badge_skips_held() {
        assert_eq!(next_xp_badge(&[]).map(|b| b.id), Some("great_start"));
        let held = vec!["great_start".to_string()];
        assert_eq!(next_xp_badge(&held).map(|b| b.id), Some("pushing_harder"));
    }

    #[test]
    fn all_xp_badges_held_means_full_progress() {
        let held: Vec<String> = xp_badges().map(|b| b.id.to_string()).collect();
        assert!(next_xp_badge(&held).is_none());
        assert!((progress_percent(700, None) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_measured_from_previous_threshold() {
        // 75 XP, next badge at 100, previous threshold at 50: halfway.
        let next = by_id("pushing_harder");
        let pct = progress_percent(75, next);
        assert!((pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn progress_clamped_to_bounds() {
        let next = by_id("great_start");
        assert!(progress_percent(-10, next).abs() < f64::EPSILON);
        assert!((progress_percent(10_000, next) - 100.0).abs() < f64::EPSILON);
    }
}
