use crate::dtos::{
    ComplaintListParams, ComplaintResponse, CreateComplaintRequest, UpdateComplaintRequest,
};
use crate::middleware::RequestContext;
use crate::models::{Complaint, ComplaintPriority, ComplaintStatus, Role};
use crate::services::access::{scoped_hostel, student_restriction};
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

pub async fn list_complaints(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    Query(params): Query<ComplaintListParams>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Student).await?;
    let student_id = student_restriction(store, &ctx, &hostel.id)
        .await?
        .or(params.student_id);

    let complaints: Vec<ComplaintResponse> = store
        .list_complaints(&hostel.id, student_id.as_deref())
        .await?
        .into_iter()
        .filter(|c| params.status.is_none_or(|s| s == c.status))
        .map(ComplaintResponse::from)
        .collect();
    Ok(Json(complaints))
}

pub async fn create_complaint(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateComplaintRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Student).await?;

    let student_id = match student_restriction(store, &ctx, &hostel.id).await? {
        Some(own) => own,
        None => {
            let student_id = req
                .student_id
                .ok_or_else(|| AppError::bad_request("student_id is required"))?;
            store
                .get_student(&hostel.id, &student_id)
                .await?
                .ok_or_else(|| AppError::not_found("Student not found"))?
                .id
        }
    };

    let complaint = Complaint::new(
        hostel.id,
        student_id,
        req.title,
        req.description,
        req.category,
        req.priority.unwrap_or(ComplaintPriority::Medium),
    );
    store.insert_complaint(&complaint).await?;

    tracing::info!(complaint_id = %complaint.id, category = ?complaint.category, "Complaint filed");

    Ok((StatusCode::CREATED, Json(ComplaintResponse::from(complaint))))
}

pub async fn update_complaint(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, complaint_id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<UpdateComplaintRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Manager).await?;
    let mut complaint = store
        .get_complaint(&hostel.id, &complaint_id)
        .await?
        .ok_or_else(|| AppError::not_found("Complaint not found"))?;

    if let Some(status) = req.status {
        if status != complaint.status {
            if !complaint.status.can_transition_to(status) {
                return Err(AppError::conflict(format!(
                    "Cannot move complaint from {:?} to {:?}",
                    complaint.status, status
                )));
            }
            if status == ComplaintStatus::Resolved {
                complaint.resolved_by = Some(ctx.user_id.clone());
                complaint.resolved_at = Some(mongodb::bson::DateTime::now());
            }
            complaint.status = status;
        }
    }
    if let Some(priority) = req.priority {
        complaint.priority = priority;
    }
    if let Some(resolution) = req.resolution {
        complaint.resolution = Some(resolution);
    }
    complaint.updated_at = Utc::now();

    store.update_complaint(&complaint).await?;
    Ok(Json(ComplaintResponse::from(complaint)))
}
