//! UserService gRPC implementation.

use tonic::{Request, Response, Status};
use tracing::info;
use uuid::Uuid;

use crowdcall_proto::v1::user_service_server::UserService;
use crowdcall_proto::v1::{
    BadgeProgressResponse, CreateUserRequest, CreateUserResponse, GetBadgeProgressRequest,
    GetUserByProviderRequest, GetUserRequest, LinkProviderRequest, ListUserActivitiesRequest,
    ListUserActivitiesResponse, ListUserBadgesRequest, ListUserBadgesResponse,
    MarkBadgeViewedRequest, MarkBadgeViewedResponse, UserDetail,
};

use super::convert::{
    to_activity_entry, to_badge_detail, to_badge_grant, to_level_standing, to_status,
    to_user_detail,
};
use crate::engine::BadgeEngine;
use crate::storage::Database;

/// Activity entries returned when the request leaves the limit unset.
const DEFAULT_ACTIVITY_LIMIT: u32 = 10;

/// UserService implementation backed by the badge engine and storage.
pub struct UserServiceImpl {
    db: Database,
    badges: BadgeEngine,
}

impl UserServiceImpl {
    pub const fn new(db: Database, badges: BadgeEngine) -> Self {
        Self { db, badges }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[tonic::async_trait]
impl UserService for UserServiceImpl {
    async fn create_user(
        &self,
        request: Request<CreateUserRequest>,
    ) -> Result<Response<CreateUserResponse>, Status> {
        let req = request.into_inner();

        let id = Uuid::new_v4().to_string();
        let user = self
            .db
            .create_user(
                &id,
                non_empty(req.provider_id).as_deref(),
                non_empty(req.wallet_address).as_deref(),
                non_empty(req.email).as_deref(),
            )
            .await
            .map_err(|e| to_status(e.into()))?;

        // New users get the welcome badge right away.
        let new_badges = self
            .badges
            .check_and_award(&user.id, user.xp)
            .await
            .map_err(to_status)?;

        info!(user_id = %user.id, "User created via gRPC");

        Ok(Response::new(CreateUserResponse {
            new_badges: new_badges.iter().map(to_badge_grant).collect(),
            user: Some(to_user_detail(user)),
        }))
    }

    async fn get_user(
        &self,
        request: Request<GetUserRequest>,
    ) -> Result<Response<UserDetail>, Status> {
        let req = request.into_inner();
        let user = self
            .db
            .get_user(&req.id)
            .await
            .map_err(|e| to_status(e.into()))?;
        Ok(Response::new(to_user_detail(user)))
    }

    async fn get_user_by_provider(
        &self,
        request: Request<GetUserByProviderRequest>,
    ) -> Result<Response<UserDetail>, Status> {
        let req = request.into_inner();
        let user = self
            .db
            .get_user_by_provider_id(&req.provider_id)
            .await
            .map_err(|e| to_status(e.into()))?
            .ok_or_else(|| {
                Status::not_found(format!("no user for provider {}", req.provider_id))
            })?;
        Ok(Response::new(to_user_detail(user)))
    }

    async fn link_provider(
        &self,
        request: Request<LinkProviderRequest>,
    ) -> Result<Response<UserDetail>, Status> {
        let req = request.into_inner();
        if req.provider_id.is_empty() {
            return Err(Status::invalid_argument("provider_id is required"));
        }

        self.db
            .link_provider(&req.user_id, &req.provider_id)
            .await
            .map_err(|e| to_status(e.into()))?;

        let user = self
            .db
            .get_user(&req.user_id)
            .await
            .map_err(|e| to_status(e.into()))?;

        info!(user_id = %req.user_id, "Provider linked via gRPC");

        Ok(Response::new(to_user_detail(user)))
    }

    async fn list_user_badges(
        &self,
        request: Request<ListUserBadgesRequest>,
    ) -> Result<Response<ListUserBadgesResponse>, Status> {
        let req = request.into_inner();
        let badges = self
            .badges
            .list_for_user(&req.user_id)
            .await
            .map_err(to_status)?;

        Ok(Response::new(ListUserBadgesResponse {
            badges: badges.iter().map(to_badge_detail).collect(),
        }))
    }

    async fn mark_badge_viewed(
        &self,
        request: Request<MarkBadgeViewedRequest>,
    ) -> Result<Response<MarkBadgeViewedResponse>, Status> {
        let req = request.into_inner();
        let updated = self
            .badges
            .mark_viewed(&req.user_id, &req.badge_id)
            .await
            .map_err(to_status)?;

        Ok(Response::new(MarkBadgeViewedResponse { updated }))
    }

    async fn get_badge_progress(
        &self,
        request: Request<GetBadgeProgressRequest>,
    ) -> Result<Response<BadgeProgressResponse>, Status> {
        let req = request.into_inner();
        let progress = self
            .badges
            .progress(&req.user_id)
            .await
            .map_err(to_status)?;
        let standing = crowdcall_core::levels::level_for_xp(progress.current_xp);

        Ok(Response::new(BadgeProgressResponse {
            current_xp: progress.current_xp,
            next_badge_id: progress
                .next_badge
                .map(|b| b.id.to_string())
                .unwrap_or_default(),
            next_badge_name: progress
                .next_badge
                .map(|b| b.name.to_string())
                .unwrap_or_default(),
            next_xp_required: progress.next_badge.map(|b| b.xp_required).unwrap_or_default(),
            progress_percent: progress.progress_percent,
            level: Some(to_level_standing(&standing)),
        }))
    }

    async fn list_user_activities(
        &self,
        request: Request<ListUserActivitiesRequest>,
    ) -> Result<Response<ListUserActivitiesResponse>, Status> {
        let req = request.into_inner();
        let limit = if req.limit == 0 {
            DEFAULT_ACTIVITY_LIMIT
        } else {
            req.limit
        };

        let rows = self
            .db
            .list_user_activities(&req.user_id, limit)
            .await
            .map_err(|e| to_status(e.into()))?;

        Ok(Response::new(ListUserActivitiesResponse {
            activities: rows.into_iter().map(to_activity_entry).collect(),
        }))
    }
}
