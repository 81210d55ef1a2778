//! Crowdcall Daemon Library
//!
//! Core functionality for the Crowdcall daemon:
//! - SQLite storage for users, predictions, votes, and badges
//! - Prediction lifecycle, vote ledger, and reward distribution engines
//! - Periodic expiration sweeper
//! - Best-effort secondary-ledger mirror
//! - gRPC server for client connections

pub mod engine;
pub mod mirror;
pub mod server;
pub mod storage;
