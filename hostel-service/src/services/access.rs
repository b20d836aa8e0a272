//! Tenant scoping shared by the handlers.
//!
//! A role below the endpoint's threshold is `Forbidden`. A hostel outside
//! the caller's scope reads as `NotFound`, the same as one that does not
//! exist.

use crate::middleware::RequestContext;
use crate::models::{Hostel, HostelFilter, Role, Student, StudentFilter};
use crate::services::HostelStore;
use service_core::error::AppError;

pub async fn scoped_hostel(
    store: &dyn HostelStore,
    ctx: &RequestContext,
    hostel_id: &str,
    required: Role,
) -> Result<Hostel, AppError> {
    ctx.require(required)?;

    store
        .get_hostel(hostel_id)
        .await?
        .filter(|hostel| ctx.can_access(hostel))
        .ok_or_else(|| AppError::not_found("Hostel not found"))
}

/// Hostels the caller can see.
pub async fn visible_hostels(
    store: &dyn HostelStore,
    ctx: &RequestContext,
    active_only: bool,
) -> Result<Vec<Hostel>, AppError> {
    let filter = match ctx.role {
        Role::Admin => HostelFilter {
            active_only,
            ..Default::default()
        },
        Role::Owner => HostelFilter {
            owner_id: Some(ctx.user_id.clone()),
            active_only,
            ..Default::default()
        },
        Role::Manager | Role::Student => HostelFilter {
            ids: Some(ctx.hostel_id.iter().cloned().collect()),
            active_only,
            ..Default::default()
        },
    };
    store.list_hostels(&filter).await
}

/// The student record linked to a student caller.
pub async fn caller_student(
    store: &dyn HostelStore,
    ctx: &RequestContext,
    hostel_id: &str,
) -> Result<Student, AppError> {
    let filter = StudentFilter {
        user_id: Some(ctx.user_id.clone()),
        ..Default::default()
    };
    store
        .list_students(hostel_id, &filter)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("No student profile is linked to this user"))
}

/// For student callers, the id of their own student record; `None` for staff.
/// Used to narrow list queries and to hide other students' records.
pub async fn student_restriction(
    store: &dyn HostelStore,
    ctx: &RequestContext,
    hostel_id: &str,
) -> Result<Option<String>, AppError> {
    if ctx.is_student() {
        Ok(Some(caller_student(store, ctx, hostel_id).await?.id))
    } else {
        Ok(None)
    }
}
