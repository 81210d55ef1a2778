//! Conversions between storage/engine types and proto messages.

use tonic::Status;

use crowdcall_proto::v1::{
    ActivityEntry, BadgeGrant, LevelStanding, PredictionDetail, UserBadgeDetail, UserDetail,
};

use crate::engine::EngineError;
use crate::storage::{ActivityRow, PredictionRow, UserBadgeRow, UserRow};

/// Map a domain error onto a gRPC status.
pub fn to_status(e: EngineError) -> Status {
    match e {
        EngineError::InvalidInput(msg) => Status::invalid_argument(msg),
        EngineError::NotFound(what) => Status::not_found(format!("{what} not found")),
        EngineError::DuplicateVote | EngineError::AlreadyResolved => {
            Status::failed_precondition(e.to_string())
        }
        EngineError::RewardApplication { .. } | EngineError::Database(_) => {
            Status::internal(e.to_string())
        }
    }
}

/// Unix seconds to a proto timestamp.
pub const fn timestamp(secs: i64) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: secs,
        nanos: 0,
    }
}

/// Convert an earned badge into a grant notification, enriched from the
/// static catalog. Unknown ids (catalog drift) degrade to id-only grants.
pub fn to_badge_grant(row: &UserBadgeRow) -> BadgeGrant {
    let badge = crowdcall_core::badges::by_id(&row.badge_id);
    BadgeGrant {
        badge_id: row.badge_id.clone(),
        name: badge.map(|b| b.name.to_string()).unwrap_or_default(),
        description: badge.map(|b| b.description.to_string()).unwrap_or_default(),
        rarity: badge
            .map(|b| b.rarity.as_str().to_string())
            .unwrap_or_default(),
        xp_required: badge.map(|b| b.xp_required).unwrap_or_default(),
        earned_at: Some(timestamp(row.earned_at)),
    }
}

/// Convert an earned badge into the full badge view.
pub fn to_badge_detail(row: &UserBadgeRow) -> UserBadgeDetail {
    let badge = crowdcall_core::badges::by_id(&row.badge_id);
    UserBadgeDetail {
        badge_id: row.badge_id.clone(),
        name: badge.map(|b| b.name.to_string()).unwrap_or_default(),
        description: badge.map(|b| b.description.to_string()).unwrap_or_default(),
        rarity: badge
            .map(|b| b.rarity.as_str().to_string())
            .unwrap_or_default(),
        xp_required: badge.map(|b| b.xp_required).unwrap_or_default(),
        earned_at: Some(timestamp(row.earned_at)),
        is_new: row.is_new != 0,
    }
}

/// Convert a prediction row into its proto detail.
pub fn to_prediction_detail(row: PredictionRow) -> PredictionDetail {
    PredictionDetail {
        id: row.id,
        creator_id: row.creator_id,
        question: row.question,
        description: row.description.unwrap_or_default(),
        end_date: Some(timestamp(row.end_date)),
        status: row.status,
        result: row.result.unwrap_or_default(),
        correct_answer: row.correct_answer.unwrap_or_default(),
        total_votes: row.total_votes,
        yes_votes: row.yes_votes,
        no_votes: row.no_votes,
        created_at: Some(timestamp(row.created_at)),
    }
}

/// Convert a user row into its proto detail. The level is derived from
/// stored XP at read time.
pub fn to_user_detail(row: UserRow) -> UserDetail {
    let level = crowdcall_core::levels::level_for_xp(row.xp).level;
    UserDetail {
        id: row.id,
        provider_id: row.provider_id.unwrap_or_default(),
        wallet_address: row.wallet_address.unwrap_or_default(),
        email: row.email.unwrap_or_default(),
        xp: row.xp,
        correct_predictions: row.correct_predictions,
        total_predictions: row.total_predictions,
        created_at: Some(timestamp(row.created_at)),
        level,
    }
}

/// Convert a level standing into its proto message.
pub fn to_level_standing(standing: &crowdcall_core::LevelStanding) -> LevelStanding {
    LevelStanding {
        level: standing.level,
        current_xp: standing.current_xp,
        required_xp: standing.required_xp,
        progress_percent: standing.progress_percent,
    }
}

/// Convert a merged activity row into its proto entry.
pub fn to_activity_entry(row: ActivityRow) -> ActivityEntry {
    ActivityEntry {
        id: row.id,
        kind: row.kind,
        prediction_id: row.prediction_id,
        question: row.question,
        status: row.status,
        result: row.result.unwrap_or_default(),
        choice: row.choice.unwrap_or_default(),
        total_votes: row.total_votes,
        created_at: Some(timestamp(row.created_at)),
    }
}
