//! PredictionService gRPC implementation.

use std::str::FromStr;

use tonic::{Request, Response, Status};
use tracing::info;

use crowdcall_proto::v1::prediction_service_server::PredictionService;
use crowdcall_proto::v1::{
    CastVoteRequest, CastVoteResponse, CreatePredictionRequest, GetPredictionRequest,
    HistoryEntry, ListActivePredictionsRequest, ListActivePredictionsResponse,
    ListUserHistoryRequest, ListUserHistoryResponse, PredictionDetail, ResolvePredictionRequest,
    ResolvePredictionResponse, RewardedVoter,
};

use super::convert::{timestamp, to_badge_grant, to_prediction_detail, to_status};
use crate::engine::{LifecycleManager, VoteLedger, CORRECTNESS_XP, PARTICIPATION_XP};
use crate::storage::{Choice, Database};

/// XP a voter earns on a correct prediction (participation + correctness).
const CORRECT_TOTAL_XP: i64 = PARTICIPATION_XP + CORRECTNESS_XP;
/// XP a voter earns on a wrong prediction (participation only).
const WRONG_TOTAL_XP: i64 = PARTICIPATION_XP;

/// PredictionService implementation backed by the lifecycle manager and
/// vote ledger.
pub struct PredictionServiceImpl {
    lifecycle: LifecycleManager,
    votes: VoteLedger,
    db: Database,
}

impl PredictionServiceImpl {
    pub const fn new(lifecycle: LifecycleManager, votes: VoteLedger, db: Database) -> Self {
        Self {
            lifecycle,
            votes,
            db,
        }
    }
}

fn parse_choice(value: &str, field: &str) -> Result<Choice, Status> {
    Choice::from_str(value).map_err(|e| Status::invalid_argument(format!("{field}: {e}")))
}

fn optional_choice(value: &str, field: &str) -> Result<Option<Choice>, Status> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse_choice(value, field).map(Some)
    }
}

#[tonic::async_trait]
impl PredictionService for PredictionServiceImpl {
    async fn create_prediction(
        &self,
        request: Request<CreatePredictionRequest>,
    ) -> Result<Response<PredictionDetail>, Status> {
        let req = request.into_inner();

        let end_date = req
            .end_date
            .map(|ts| ts.seconds)
            .ok_or_else(|| Status::invalid_argument("end_date is required"))?;
        let correct_answer = optional_choice(&req.correct_answer, "correct_answer")?;
        let description = if req.description.is_empty() {
            None
        } else {
            Some(req.description.as_str())
        };

        let prediction = self
            .lifecycle
            .create(&req.creator_id, &req.question, description, end_date, correct_answer)
            .await
            .map_err(to_status)?;

        info!(id = %prediction.id, creator = %req.creator_id, "Prediction created via gRPC");

        Ok(Response::new(to_prediction_detail(prediction)))
    }

    async fn get_prediction(
        &self,
        request: Request<GetPredictionRequest>,
    ) -> Result<Response<PredictionDetail>, Status> {
        let req = request.into_inner();
        let prediction = self.lifecycle.get(&req.id).await.map_err(to_status)?;
        Ok(Response::new(to_prediction_detail(prediction)))
    }

    async fn list_active_predictions(
        &self,
        _request: Request<ListActivePredictionsRequest>,
    ) -> Result<Response<ListActivePredictionsResponse>, Status> {
        let predictions = self.lifecycle.list_active().await.map_err(to_status)?;

        Ok(Response::new(ListActivePredictionsResponse {
            predictions: predictions.into_iter().map(to_prediction_detail).collect(),
        }))
    }

    async fn cast_vote(
        &self,
        request: Request<CastVoteRequest>,
    ) -> Result<Response<CastVoteResponse>, Status> {
        let req = request.into_inner();
        let choice = parse_choice(&req.choice, "choice")?;

        let outcome = self
            .votes
            .cast_vote(&req.user_id, &req.prediction_id, choice)
            .await
            .map_err(to_status)?;

        Ok(Response::new(CastVoteResponse {
            vote_id: outcome.vote_id,
            new_badges: outcome.new_badges.iter().map(to_badge_grant).collect(),
        }))
    }

    async fn resolve_prediction(
        &self,
        request: Request<ResolvePredictionRequest>,
    ) -> Result<Response<ResolvePredictionResponse>, Status> {
        let req = request.into_inner();
        let result = parse_choice(&req.result, "result")?;

        let outcome = self
            .lifecycle
            .resolve(&req.prediction_id, result)
            .await
            .map_err(to_status)?;

        info!(
            id = %req.prediction_id,
            result = %result,
            rewarded = outcome.rewarded.len(),
            "Prediction resolved via gRPC"
        );

        Ok(Response::new(ResolvePredictionResponse {
            prediction_id: req.prediction_id,
            result: result.as_str().to_string(),
            rewarded: outcome
                .rewarded
                .into_iter()
                .map(|r| RewardedVoter {
                    user_id: r.user_id,
                    new_badges: r.new_badges.iter().map(to_badge_grant).collect(),
                })
                .collect(),
        }))
    }

    async fn list_user_history(
        &self,
        request: Request<ListUserHistoryRequest>,
    ) -> Result<Response<ListUserHistoryResponse>, Status> {
        let req = request.into_inner();

        let rows = self
            .db
            .list_user_history(&req.user_id)
            .await
            .map_err(|e| to_status(e.into()))?;

        let entries = rows
            .into_iter()
            .map(|row| {
                let is_correct = row.result.as_deref() == Some(row.user_choice.as_str());
                HistoryEntry {
                    prediction: Some(PredictionDetail {
                        id: row.prediction_id,
                        creator_id: String::new(),
                        question: row.question,
                        description: row.description.unwrap_or_default(),
                        end_date: Some(timestamp(row.end_date)),
                        status: "resolved".to_string(),
                        result: row.result.unwrap_or_default(),
                        correct_answer: String::new(),
                        total_votes: row.total_votes,
                        yes_votes: row.yes_votes,
                        no_votes: row.no_votes,
                        created_at: None,
                    }),
                    user_choice: row.user_choice,
                    is_correct,
                    xp_earned: if is_correct {
                        CORRECT_TOTAL_XP
                    } else {
                        WRONG_TOTAL_XP
                    },
                    voted_at: Some(timestamp(row.voted_at)),
                }
            })
            .collect();

        Ok(Response::new(ListUserHistoryResponse { entries }))
    }
}
