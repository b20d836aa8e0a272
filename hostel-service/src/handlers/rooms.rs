use crate::dtos::{CreateRoomRequest, RoomResponse, UpdateRoomRequest};
use crate::middleware::RequestContext;
use crate::models::{Role, Room};
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

pub async fn list_rooms(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Student).await?;
    let rooms = state.store.list_rooms(&hostel.id).await?;
    let rooms: Vec<RoomResponse> = rooms.into_iter().map(RoomResponse::from).collect();
    Ok(Json(rooms))
}

pub async fn create_room(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Manager).await?;

    let room = Room::new(hostel.id, req.number, req.floor, req.room_type, req.capacity);
    state.store.insert_room(&room).await?;

    tracing::info!(room_id = %room.id, number = %room.number, "Room created");

    Ok((StatusCode::CREATED, Json(RoomResponse::from(room))))
}

pub async fn get_room(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, room_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Student).await?;
    let room = state
        .store
        .get_room(&hostel.id, &room_id)
        .await?
        .ok_or_else(|| AppError::not_found("Room not found"))?;
    Ok(Json(RoomResponse::from(room)))
}

pub async fn update_room(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, room_id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<UpdateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Manager).await?;
    let mut room = state
        .store
        .get_room(&hostel.id, &room_id)
        .await?
        .ok_or_else(|| AppError::not_found("Room not found"))?;

    if let Some(number) = req.number {
        room.number = number;
    }
    if let Some(floor) = req.floor {
        room.floor = floor;
    }
    if let Some(room_type) = req.room_type {
        room.room_type = room_type;
    }
    if let Some(capacity) = req.capacity {
        if capacity < room.occupied {
            return Err(AppError::conflict(format!(
                "Capacity {} is below current occupancy {}",
                capacity, room.occupied
            )));
        }
        room.capacity = capacity;
    }
    if let Some(is_active) = req.is_active {
        room.is_active = is_active;
    }
    room.updated_at = Utc::now();

    state.store.update_room(&room).await?;
    Ok(Json(RoomResponse::from(room)))
}

pub async fn delete_room(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, room_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Manager).await?;
    state
        .store
        .get_room(&hostel.id, &room_id)
        .await?
        .ok_or_else(|| AppError::not_found("Room not found"))?;

    if !state.store.delete_room(&hostel.id, &room_id).await? {
        return Err(AppError::conflict("Room still has students assigned"));
    }

    tracing::info!(room_id = %room_id, "Room deleted");

    Ok(StatusCode::NO_CONTENT)
}
