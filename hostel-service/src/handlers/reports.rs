use crate::dtos::ReportParams;
use crate::middleware::RequestContext;
use crate::models::{current_period, HostelFilter, Role};
use crate::services::access::scoped_hostel;
use crate::services::reports::{billing_overview, hostel_summary};
use crate::services::BillingService;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

fn period(params: &ReportParams) -> Result<(i32, i32), AppError> {
    let (month, year) = current_period();
    let month = params.month.unwrap_or(month);
    let year = params.year.unwrap_or(year);
    BillingService::validate_period(month, year)?;
    Ok((month, year))
}

pub async fn hostel_report(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, AppError> {
    let (month, year) = period(&params)?;
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Manager).await?;

    let summary = hostel_summary(store, &hostel, month, year, Utc::now().date_naive()).await?;
    Ok(Json(summary))
}

pub async fn admin_overview(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require(Role::Admin)?;
    let (month, year) = period(&params)?;
    let store = state.store.as_ref();

    let hostels = store.list_hostels(&HostelFilter::default()).await?;
    let overview = billing_overview(store, &hostels, month, year, Utc::now().date_naive()).await?;
    Ok(Json(overview))
}
