//! gRPC server for the Crowdcall daemon.

mod config;
mod convert;
mod leaderboard_svc;
mod prediction_svc;
mod user_svc;

pub use config::ServerConfig;
pub use leaderboard_svc::LeaderboardServiceImpl;
pub use prediction_svc::PredictionServiceImpl;
pub use user_svc::UserServiceImpl;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tonic::transport::Server;
use tracing::info;

use crowdcall_proto::v1::leaderboard_service_server::LeaderboardServiceServer;
use crowdcall_proto::v1::prediction_service_server::PredictionServiceServer;
use crowdcall_proto::v1::user_service_server::UserServiceServer;

use crate::engine::{BadgeEngine, Leaderboard, LifecycleManager, RewardEngine, Sweeper, VoteLedger};
use crate::mirror::LedgerMirror;
use crate::storage::Database;

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// gRPC server handle wiring the engines together.
pub struct GrpcServer {
    config: ServerConfig,
    db: Database,
    badges: BadgeEngine,
    lifecycle: LifecycleManager,
    votes: VoteLedger,
    leaderboard: Leaderboard,
}

impl GrpcServer {
    /// Create a new gRPC server with all engines wired together.
    pub fn new(config: ServerConfig, db: Database, mirror: Arc<dyn LedgerMirror>) -> Self {
        let badges = BadgeEngine::new(db.clone());
        let rewards = RewardEngine::new(db.clone(), badges.clone());
        let lifecycle = LifecycleManager::new(db.clone(), rewards.clone(), Arc::clone(&mirror));
        let votes = VoteLedger::new(db.clone(), rewards, mirror);
        let leaderboard = Leaderboard::new(db.clone());

        Self {
            config,
            db,
            badges,
            lifecycle,
            votes,
            leaderboard,
        }
    }

    /// Build the sweeper sharing this server's lifecycle manager.
    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(self.db.clone(), self.lifecycle.clone())
    }

    /// Get the server configuration.
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get a reference to the database.
    pub const fn db(&self) -> &Database {
        &self.db
    }

    /// Start serving on a TCP socket until the transport shuts down.
    pub async fn serve_tcp(self, addr: SocketAddr) -> Result<(), ServerError> {
        let prediction_service =
            PredictionServiceImpl::new(self.lifecycle.clone(), self.votes.clone(), self.db.clone());
        let user_service = UserServiceImpl::new(self.db.clone(), self.badges.clone());
        let leaderboard_service =
            LeaderboardServiceImpl::new(self.leaderboard.clone(), self.config.default_leaderboard_limit);

        // The overall service reports serving as soon as the transport is up.
        let (_health_reporter, health_service) = tonic_health::server::health_reporter();

        info!(%addr, "Starting gRPC server on TCP");

        Server::builder()
            .http2_keepalive_interval(Some(Duration::from_secs(30)))
            .http2_keepalive_timeout(Some(Duration::from_secs(10)))
            .add_service(PredictionServiceServer::new(prediction_service))
            .add_service(UserServiceServer::new(user_service))
            .add_service(LeaderboardServiceServer::new(leaderboard_service))
            .add_service(health_service)
            .serve(addr)
            .await?;

        Ok(())
    }
}
