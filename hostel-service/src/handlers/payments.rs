use crate::dtos::{
    CreatePaymentRequest, GenerateInvoicesRequest, PaymentListParams, PaymentListResponse,
    PaymentResponse, StatusReasonRequest, SubmitProofRequest,
};
use crate::middleware::RequestContext;
use crate::models::{Payment, PaymentFilter, Role, Room, Student, StudentFilter};
use crate::services::access::{scoped_hostel, student_restriction, visible_hostels};
use crate::services::{GenerationSummary, HostelStore, ManualPayment, Page, ProofSubmission};
use crate::startup::AppState;
use crate::utils::{OptionalValidatedJson, ValidatedJson};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use service_core::error::AppError;
use std::collections::HashMap;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Builds the response with the student's name and room number.
async fn payment_response(
    store: &dyn HostelStore,
    payment: Payment,
) -> Result<PaymentResponse, AppError> {
    let student = store
        .get_student(&payment.hostel_id, &payment.student_id)
        .await?;
    let room = match student.as_ref().and_then(|s| s.room_id.as_deref()) {
        Some(room_id) => store.get_room(&payment.hostel_id, room_id).await?,
        None => None,
    };
    Ok(PaymentResponse::new(
        payment,
        today(),
        student.as_ref(),
        room.as_ref(),
    ))
}

/// Loads a payment, hiding other students' payments from a student caller.
async fn visible_payment(
    store: &dyn HostelStore,
    ctx: &RequestContext,
    hostel_id: &str,
    payment_id: &str,
) -> Result<Payment, AppError> {
    let own = student_restriction(store, ctx, hostel_id).await?;
    store
        .get_payment(hostel_id, payment_id)
        .await?
        .filter(|p| own.as_deref().is_none_or(|id| id == p.student_id))
        .ok_or_else(|| AppError::not_found("Payment not found"))
}

pub async fn list_payments(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    Query(params): Query<PaymentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Student).await?;
    let own = student_restriction(store, &ctx, &hostel.id).await?;
    let today = today();

    let filter = PaymentFilter {
        hostel_id: Some(hostel.id.clone()),
        student_id: own.or(params.student_id),
        status: params.status,
        payment_type: params.payment_type,
        month: params.month,
        year: params.year,
        today: Some(today),
    };
    let page = Page::from_params(params.page, params.page_size);
    let (payments, total) = store.list_payments(&filter, Some(page)).await?;

    let students: HashMap<String, Student> = store
        .list_students(&hostel.id, &StudentFilter::default())
        .await?
        .into_iter()
        .map(|s| (s.id.clone(), s))
        .collect();
    let rooms: HashMap<String, Room> = store
        .list_rooms(&hostel.id)
        .await?
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect();

    let payments = payments
        .into_iter()
        .map(|p| {
            let student = students.get(&p.student_id);
            let room = student
                .and_then(|s| s.room_id.as_ref())
                .and_then(|id| rooms.get(id));
            PaymentResponse::new(p, today, student, room)
        })
        .collect();

    let page_size = page.limit as u64;
    Ok(Json(PaymentListResponse {
        payments,
        total,
        page: page.skip / page_size + 1,
        page_size,
        total_pages: total.div_ceil(page_size),
    }))
}

pub async fn create_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreatePaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Manager).await?;

    let payment = state
        .billing
        .record_payment(
            &ctx,
            &hostel.id,
            ManualPayment {
                student_id: req.student_id,
                amount: req.amount,
                payment_type: req.payment_type,
                month: req.month,
                year: req.year,
                method: req.method,
                transaction_ref: req.transaction_ref,
                notes: req.notes,
                paid: req.paid,
            },
        )
        .await?;

    let response = payment_response(state.store.as_ref(), payment).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn generate_for_hostel(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(hostel_id): Path<String>,
    ValidatedJson(req): ValidatedJson<GenerateInvoicesRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Manager).await?;

    tracing::info!(
        hostel_id = %hostel.id,
        month = req.month,
        year = req.year,
        "Invoice generation requested"
    );

    let outcome = state
        .billing
        .generate_for_hostel(&hostel, req.month, req.year)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Generates invoices for every hostel in the caller's scope. A manager
/// only has one hostel and gets the single-hostel behaviour.
pub async fn generate_all(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(req): ValidatedJson<GenerateInvoicesRequest>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require(Role::Manager)?;
    let hostels = visible_hostels(state.store.as_ref(), &ctx, false).await?;

    tracing::info!(
        role = %ctx.role,
        hostels = hostels.len(),
        month = req.month,
        year = req.year,
        "Invoice generation requested"
    );

    let summary = if ctx.role == Role::Manager {
        let hostel = hostels
            .first()
            .ok_or_else(|| AppError::not_found("Hostel not found"))?;
        let outcome = state
            .billing
            .generate_for_hostel(hostel, req.month, req.year)
            .await?;
        GenerationSummary {
            month: req.month,
            year: req.year,
            total_created: outcome.created,
            outcomes: vec![outcome],
            already_generated: Vec::new(),
            failed: Vec::new(),
        }
    } else {
        state
            .billing
            .generate_for_hostels(&hostels, req.month, req.year)
            .await?
    };

    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, payment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Student).await?;
    let payment = visible_payment(store, &ctx, &hostel.id, &payment_id).await?;
    Ok(Json(payment_response(store, payment).await?))
}

pub async fn submit_proof(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, payment_id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<SubmitProofRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let hostel = scoped_hostel(store, &ctx, &hostel_id, Role::Student).await?;
    visible_payment(store, &ctx, &hostel.id, &payment_id).await?;

    let payment = state
        .billing
        .submit_proof(
            &hostel.id,
            &payment_id,
            ProofSubmission {
                proof_image: req.proof_image,
                transaction_ref: req.transaction_ref,
                method: req.method,
            },
        )
        .await?;
    Ok(Json(payment_response(store, payment).await?))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, payment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Manager).await?;
    let payment = state.billing.verify(&ctx, &hostel.id, &payment_id).await?;
    Ok(Json(payment_response(state.store.as_ref(), payment).await?))
}

pub async fn reject_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, payment_id)): Path<(String, String)>,
    OptionalValidatedJson(body): OptionalValidatedJson<StatusReasonRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Manager).await?;
    let reason = body.and_then(|req| req.reason);
    let payment = state
        .billing
        .reject(&ctx, &hostel.id, &payment_id, reason)
        .await?;
    Ok(Json(payment_response(state.store.as_ref(), payment).await?))
}

pub async fn refund_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((hostel_id, payment_id)): Path<(String, String)>,
    OptionalValidatedJson(body): OptionalValidatedJson<StatusReasonRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hostel = scoped_hostel(state.store.as_ref(), &ctx, &hostel_id, Role::Owner).await?;
    let reason = body.and_then(|req| req.reason);
    let payment = state.billing.refund(&hostel.id, &payment_id, reason).await?;
    Ok(Json(payment_response(state.store.as_ref(), payment).await?))
}
