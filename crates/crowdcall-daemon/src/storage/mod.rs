//! SQLite storage for the Crowdcall daemon.

mod db;
mod models;
mod prediction_queries;
mod queries;

pub use db::Database;
pub use models::{
    ActivityRow, Choice, PredictionRow, PredictionStatus, UserBadgeRow, UserHistoryRow, UserRow,
    VoteRow,
};

pub use crowdcall_core::db::DatabaseError;
