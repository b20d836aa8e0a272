use crate::dtos::{CreateManagerRequest, ManagerResponse};
use crate::middleware::RequestContext;
use crate::models::{Role, User};
use crate::services::access::scoped_hostel;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

pub async fn list_managers(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Owner).await?;
    let users = state.store.list_users(&hostel.id).await?;
    let managers: Vec<ManagerResponse> = users.into_iter().map(ManagerResponse::from).collect();
    Ok(Json(managers))
}

pub async fn create_manager(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateManagerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Owner).await?;

    let user = User::new_manager(
        hostel.id,
        req.name,
        req.email.to_lowercase(),
        req.phone,
        ctx.user_id.clone(),
    );
    state.store.insert_user(&user).await?;

    tracing::info!(user_id = %user.id, hostel_id = %user.hostel_id, "Manager created");

    Ok((StatusCode::CREATED, Json(ManagerResponse::from(user))))
}

pub async fn deactivate_manager(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Owner).await?;
    let mut user = state
        .store
        .get_user(&hostel.id, &user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Manager not found"))?;

    user.is_active = false;
    user.updated_at = Utc::now();
    state.store.update_user(&user).await?;

    tracing::info!(user_id = %user.id, "Manager deactivated");

    Ok(Json(ManagerResponse::from(user)))
}
