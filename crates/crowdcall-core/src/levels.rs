//! XP level curve.
//!
//! Levels are a coarse presentation of XP, independent of the badge
//! catalog. The curve is a fixed threshold table; past the top threshold
//! the user stays at max level and progress restarts every 1000 XP.

/// XP needed to enter each level, ascending. Index 0 is level 1.
pub const LEVEL_THRESHOLDS: &[i64] = &[0, 100, 300, 600, 1000, 1500, 2200, 3000, 4000, 5500];

/// XP span of a "lap" at max level.
const MAX_LEVEL_SPAN: i64 = 1000;

/// A user's position on the level curve.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelStanding {
    pub level: u32,
    /// XP accumulated past the current level's entry threshold.
    pub current_xp: i64,
    /// XP span of the current level.
    pub required_xp: i64,
    pub progress_percent: f64,
}

/// Place an XP total on the level curve. Negative XP counts as zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn level_for_xp(xp: i64) -> LevelStanding {
    let xp = xp.max(0);

    for (i, pair) in LEVEL_THRESHOLDS.windows(2).enumerate() {
        if xp < pair[1] {
            let gained = xp - pair[0];
            let span = pair[1] - pair[0];
            return LevelStanding {
                level: i as u32 + 1,
                current_xp: gained,
                required_xp: span,
                progress_percent: gained as f64 / span as f64 * 100.0,
            };
        }
    }

    let top = LEVEL_THRESHOLDS[LEVEL_THRESHOLDS.len() - 1];
    let gained = (xp - top) % MAX_LEVEL_SPAN;
    LevelStanding {
        level: LEVEL_THRESHOLDS.len() as u32,
        current_xp: gained,
        required_xp: MAX_LEVEL_SPAN,
        progress_percent: gained as f64 / MAX_LEVEL_SPAN as f64 * 100.0,
    }
}
