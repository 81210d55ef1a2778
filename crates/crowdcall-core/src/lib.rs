//! Crowdcall Core Library
//!
//! Shared functionality for Crowdcall components:
//! - `SQLite` pool helpers and common database errors
//! - The static badge catalog and XP level curve
//! - Tracing/logging initialization

pub mod badges;
pub mod db;
pub mod levels;
pub mod tracing_init;

pub use badges::{Badge, BadgeKind, Rarity};
pub use db::DatabaseError;
pub use levels::LevelStanding;
