use crate::dtos::{
    AssignRoomRequest, CreateStudentRequest, StudentListParams, StudentListResponse,
    StudentResponse, UpdateStudentRequest,
};
use crate::middleware::RequestContext;
use crate::models::{NewStudent, Role, Room, Student, StudentFilter};
use crate::services::access::{caller_student, scoped_hostel};
use crate::services::{HostelStore, Page};
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
use std::collections::HashMap;

async fn find_student(
    store: &dyn HostelStore,
    hostel_id: &str,
    student_id: &str,
) -> Result<Student, AppError> {
    store
        .get_student(hostel_id, student_id)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))
}

async fn room_of(store: &dyn HostelStore, student: &Student) -> Result<Option<Room>, AppError> {
    match student.room_id {
        Some(ref room_id) => store.get_room(&student.hostel_id, room_id).await,
        None => Ok(None),
    }
}

/// Takes a bed in `room_id`, failing with `Conflict` when the room is full
/// or inactive.
async fn take_bed(store: &dyn HostelStore, hostel_id: &str, room_id: &str) -> Result<Room, AppError> {
    let room = store
        .get_room(hostel_id, room_id)
        .await?
        .ok_or_else(|| AppError::not_found("Room not found"))?;

    if !store.reserve_bed(hostel_id, room_id).await? {
        return Err(AppError::conflict(format!(
            "Room {} has no free beds",
            room.number
        )));
    }
    Ok(room)
}

pub async fn list_students(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    Query(params): Query<StudentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Manager).await?;

    let filter = StudentFilter {
        is_active: params.is_active,
        room_id: params.room_id,
        user_id: None,
    };
    let students = store.list_students(&hostel.id, &filter).await?;
    let rooms: HashMap<String, Room> = store
        .list_rooms(&hostel.id)
        .await?
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect();

    let page = Page::from_params(params.page, params.page_size);
    let total = students.len() as u64;
    let page_size = page.limit as u64;
    let students: Vec<StudentResponse> = students
        .into_iter()
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .map(|s| {
            let room = s.room_id.as_ref().and_then(|id| rooms.get(id));
            StudentResponse::new(s, room)
        })
        .collect();

    Ok(Json(StudentListResponse {
        students,
        total,
        page: page.skip / page_size + 1,
        page_size,
        total_pages: total.div_ceil(page_size),
    }))
}

pub async fn create_student(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Manager).await?;

    if !hostel.is_active {
        return Err(AppError::bad_request("Cannot register students in an inactive hostel"));
    }

    let mut student = Student::new(NewStudent {
        hostel_id: hostel.id.clone(),
        user_id: req.user_id,
        name: req.name,
        email: req.email,
        phone: req.phone,
        guardian_name: req.guardian_name,
        guardian_phone: req.guardian_phone,
        monthly_fee: req.monthly_fee,
    });

    let room = match req.room_id {
        Some(ref room_id) => Some(take_bed(store, &hostel.id, room_id).await?),
        None => None,
    };
    student.room_id = room.as_ref().map(|r| r.id.clone());

    if let Err(e) = store.insert_student(&student).await {
        if let Some(ref room) = room {
            store.release_bed(&hostel.id, &room.id).await?;
        }
        return Err(e);
    }

    tracing::info!(student_id = %student.id, hostel_id = %hostel.id, "Student registered");

    Ok((
        StatusCode::CREATED,
        Json(StudentResponse::new(student, room.as_ref())),
    ))
}

pub async fn get_student(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, student_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Student).await?;

    if ctx.is_student() && caller_student(store, &ctx, &hostel.id).await?.id != student_id {
        return Err(AppError::not_found("Student not found"));
    }

    let student = find_student(store, &hostel.id, &student_id).await?;
    let room = room_of(store, &student).await?;
    Ok(Json(StudentResponse::new(student, room.as_ref())))
}

pub async fn update_student(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, student_id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<UpdateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Manager).await?;
    let mut student = find_student(store, &hostel.id, &student_id).await?;

    if let Some(name) = req.name {
        student.name = name;
    }
    if let Some(email) = req.email {
        student.email = email;
    }
    if let Some(phone) = req.phone {
        student.phone = Some(phone);
    }
    if let Some(guardian_name) = req.guardian_name {
        student.guardian_name = Some(guardian_name);
    }
    if let Some(guardian_phone) = req.guardian_phone {
        student.guardian_phone = Some(guardian_phone);
    }
    // Only future invoices pick up a new fee.
    if let Some(monthly_fee) = req.monthly_fee {
        student.monthly_fee = monthly_fee;
    }
    if let Some(user_id) = req.user_id {
        student.user_id = Some(user_id);
    }
    student.updated_at = Utc::now();

    store.update_student(&student).await?;
    let room = room_of(store, &student).await?;
    Ok(Json(StudentResponse::new(student, room.as_ref())))
}

/// Assigns or moves a student to a room. The new bed is taken before the
/// old one is released, so a full target room leaves the student in place.
pub async fn assign_room(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, student_id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<AssignRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Manager).await?;
    let mut student = find_student(store, &hostel.id, &student_id).await?;

    if !student.is_active {
        return Err(AppError::bad_request("Student has left the hostel"));
    }

    if student.room_id.as_deref() == Some(req.room_id.as_str()) {
        let room = room_of(store, &student).await?;
        return Ok(Json(StudentResponse::new(student, room.as_ref())));
    }

    let room = take_bed(store, &hostel.id, &req.room_id).await?;
    let previous = student.room_id.replace(room.id.clone());
    student.updated_at = Utc::now();

    if let Err(e) = store.update_student(&student).await {
        store.release_bed(&hostel.id, &room.id).await?;
        return Err(e);
    }
    if let Some(previous) = previous {
        store.release_bed(&hostel.id, &previous).await?;
    }

    tracing::info!(
        student_id = %student.id,
        room_id = %room.id,
        "Student assigned to room"
    );

    Ok(Json(StudentResponse::new(student, Some(&room))))
}

/// Marks the student as departed and frees their bed. Payment history is kept.
pub async fn leave_hostel(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, student_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Manager).await?;
    let mut student = find_student(store, &hostel.id, &student_id).await?;

    if !student.is_active {
        return Err(AppError::conflict("Student has already left"));
    }

    let previous = student.room_id.take();
    student.is_active = false;
    student.left_at = Some(mongodb::bson::DateTime::now());
    student.updated_at = Utc::now();
    store.update_student(&student).await?;

    if let Some(room_id) = previous {
        store.release_bed(&hostel.id, &room_id).await?;
    }

    tracing::info!(student_id = %student.id, "Student left hostel");

    Ok(Json(StudentResponse::new(student, None)))
}
