use crate::dtos::{CreateHostelRequest, HostelListParams, HostelResponse, UpdateHostelRequest};
use crate::middleware::RequestContext;
use crate::models::{Hostel, Role};
use crate::services::access::{scoped_hostel, visible_hostels};
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

pub async fn create_hostel(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(req): ValidatedJson<CreateHostelRequest>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require(Role::Owner)?;

    let owner_id = match req.owner_id {
        Some(owner_id) if ctx.is_admin() => owner_id,
        _ => ctx.user_id.clone(),
    };

    let hostel = Hostel::new(owner_id, req.name, req.address, req.city, req.phone);
    state.store.insert_hostel(&hostel).await?;

    tracing::info!(hostel_id = %hostel.id, owner_id = %hostel.owner_id, "Hostel created");

    Ok((StatusCode::CREATED, Json(HostelResponse::from(hostel))))
}

pub async fn list_hostels(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<HostelListParams>,
) -> Result<impl IntoResponse, AppError> {
    let hostels = visible_hostels(state.store.as_ref(), &ctx, params.active_only).await?;
    let hostels: Vec<HostelResponse> = hostels.into_iter().map(HostelResponse::from).collect();
    Ok(Json(hostels))
}

pub async fn get_hostel(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Student).await?;
    Ok(Json(HostelResponse::from(hostel)))
}

pub async fn update_hostel(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateHostelRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Owner).await?;

    if let Some(name) = req.name {
        hostel.name = name;
    }
    if let Some(address) = req.address {
        hostel.address = address;
    }
    if let Some(city) = req.city {
        hostel.city = city;
    }
    if let Some(phone) = req.phone {
        hostel.phone = Some(phone);
    }
    if let Some(is_active) = req.is_active {
        hostel.is_active = is_active;
    }
    hostel.updated_at = Utc::now();

    state.store.update_hostel(&hostel).await?;
    Ok(Json(HostelResponse::from(hostel)))
}

/// Hostels are never removed; deleting one deactivates it.
pub async fn deactivate_hostel(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Owner).await?;

    hostel.is_active = false;
    hostel.updated_at = Utc::now();
    state.store.update_hostel(&hostel).await?;

    tracing::info!(hostel_id = %hostel.id, "Hostel deactivated");

    Ok(Json(HostelResponse::from(hostel)))
}
