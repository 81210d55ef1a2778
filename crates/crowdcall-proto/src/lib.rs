//! Crowdcall Protocol Buffers
//!
//! Generated protobuf code for the Crowdcall gRPC API.
//!
//! This crate contains:
//! - `PredictionService` for prediction lifecycle and voting
//! - `UserService` for identity entry points and badge views
//! - `LeaderboardService` for the XP ranking

#![allow(clippy::derive_partial_eq_without_eq)]

/// Crowdcall v1 API definitions.
///
/// All generated types and services are included here.
pub mod v1 {
    tonic::include_proto!("crowdcall.v1");
}

// Re-export v1 as the default API version for convenience
pub use v1::*;

// Re-export prost_types for downstream crates that need Timestamp conversion
pub use prost_types;
