//! LeaderboardService gRPC implementation.

use tonic::{Request, Response, Status};

use crowdcall_proto::v1::leaderboard_service_server::LeaderboardService;
use crowdcall_proto::v1::{GetLeaderboardRequest, GetLeaderboardResponse, LeaderboardEntry};

use super::convert::to_status;
use crate::engine::Leaderboard;

/// LeaderboardService implementation backed by the aggregator.
pub struct LeaderboardServiceImpl {
    leaderboard: Leaderboard,
    default_limit: u32,
}

impl LeaderboardServiceImpl {
    pub const fn new(leaderboard: Leaderboard, default_limit: u32) -> Self {
        Self {
            leaderboard,
            default_limit,
        }
    }
}

#[tonic::async_trait]
impl LeaderboardService for LeaderboardServiceImpl {
    async fn get_leaderboard(
        &self,
        request: Request<GetLeaderboardRequest>,
    ) -> Result<Response<GetLeaderboardResponse>, Status> {
        let req = request.into_inner();
        let limit = if req.limit == 0 {
            self.default_limit
        } else {
            req.limit
        };

        let entries = self.leaderboard.top(limit).await.map_err(to_status)?;

        Ok(Response::new(GetLeaderboardResponse {
            entries: entries
                .into_iter()
                .map(|e| LeaderboardEntry {
                    user_id: e.user_id,
                    xp: e.xp,
                    correct_predictions: e.correct_predictions,
                    total_predictions: e.total_predictions,
                    success_rate: e.success_rate,
                })
                .collect(),
        }))
    }
}
