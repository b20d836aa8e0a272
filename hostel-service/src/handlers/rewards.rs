use crate::dtos::{CreateRewardRequest, RewardListParams, RewardListResponse, RewardResponse};
use crate::middleware::RequestContext;
use crate::models::{Reward, Role};
use crate::services::access::{scoped_hostel, student_restriction};
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

pub async fn list_rewards(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    Query(params): Query<RewardListParams>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Student).await?;
    let student_id = student_restriction(store, &ctx, &hostel.id)
        .await?
        .or(params.student_id);

    let rewards = store
        .list_rewards(&hostel.id, student_id.as_deref())
        .await?;
    let total_points = rewards.iter().map(|r| r.points as i64).sum();

    Ok(Json(RewardListResponse {
        rewards: rewards.into_iter().map(RewardResponse::from).collect(),
        total_points,
    }))
}

pub async fn create_reward(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateRewardRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Manager).await?;
    let student = store
        .get_student(&hostel.id, &req.student_id)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))?;

    let reward = Reward::new(
        hostel.id,
        student.id,
        req.points,
        req.reason,
        ctx.user_id.clone(),
    );
    store.insert_reward(&reward).await?;

    tracing::info!(reward_id = %reward.id, points = reward.points, "Reward awarded");

    Ok((StatusCode::CREATED, Json(RewardResponse::from(reward))))
}
