//! Monthly invoice generation and the payment verification workflow.

use crate::config::BillingConfig;
use crate::middleware::RequestContext;
use crate::models::{
    Hostel, NewPayment, Payment, PaymentError, PaymentFilter, PaymentMethod, PaymentStatus,
    PaymentType, PaymentUpdate, StudentFilter,
};
use crate::services::metrics as billing_metrics;
use crate::services::HostelStore;
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;

/// Result of running the generator for one hostel.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub hostel_id: String,
    pub month: i32,
    pub year: i32,
    pub created: u64,
    /// Students whose invoice already existed (a concurrent run got there first).
    pub skipped: u64,
    pub failed: u64,
}

impl GenerationOutcome {
    fn empty(hostel_id: &str, month: i32, year: i32) -> Self {
        Self {
            hostel_id: hostel_id.to_string(),
            month,
            year,
            created: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HostelFailure {
    pub hostel_id: String,
    pub error: String,
}

/// Result of a multi-hostel trigger.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub month: i32,
    pub year: i32,
    pub outcomes: Vec<GenerationOutcome>,
    pub already_generated: Vec<String>,
    pub failed: Vec<HostelFailure>,
    pub total_created: u64,
}

/// Proof submitted by a student for an unpaid invoice.
#[derive(Debug, Clone)]
pub struct ProofSubmission {
    pub proof_image: String,
    pub transaction_ref: Option<String>,
    pub method: Option<PaymentMethod>,
}

/// A one-off charge or a payment taken at the desk.
#[derive(Debug, Clone)]
pub struct ManualPayment {
    pub student_id: String,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub month: i32,
    pub year: i32,
    pub method: Option<PaymentMethod>,
    pub transaction_ref: Option<String>,
    pub notes: Option<String>,
    /// Record as already collected and verified by the caller.
    pub paid: bool,
}

#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn HostelStore>,
    config: BillingConfig,
}

impl BillingService {
    pub fn new(store: Arc<dyn HostelStore>, config: BillingConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn validate_period(month: i32, year: i32) -> Result<(), PaymentError> {
        if (1..=12).contains(&month) && (2000..=2100).contains(&year) {
            Ok(())
        } else {
            Err(PaymentError::InvalidPeriod { month, year })
        }
    }

    async fn already_generated(
        &self,
        hostel_id: &str,
        month: i32,
        year: i32,
    ) -> Result<bool, AppError> {
        let filter = PaymentFilter {
            hostel_id: Some(hostel_id.to_string()),
            payment_type: Some(PaymentType::Rent),
            month: Some(month),
            year: Some(year),
            ..Default::default()
        };
        Ok(self.store.count_payments(&filter).await? > 0)
    }

    /// Inserts one RENT invoice per active student. Inserts are independent:
    /// a duplicate counts as skipped, any other failure is logged and counted.
    async fn issue_invoices(
        &self,
        hostel: &Hostel,
        month: i32,
        year: i32,
    ) -> Result<GenerationOutcome, AppError> {
        let filter = StudentFilter {
            is_active: Some(true),
            ..Default::default()
        };
        let students = self.store.list_students(&hostel.id, &filter).await?;
        let mut outcome = GenerationOutcome::empty(&hostel.id, month, year);

        for student in students {
            let payment = Payment::new(NewPayment {
                hostel_id: hostel.id.clone(),
                student_id: student.id.clone(),
                amount: student.monthly_fee,
                payment_type: PaymentType::Rent,
                month,
                year,
                due_day: self.config.due_day,
                notes: None,
            })?;

            match self.store.insert_payment(&payment).await {
                Ok(()) => outcome.created += 1,
                Err(AppError::Conflict(_)) => {
                    tracing::debug!(student_id = %student.id, "Invoice already exists, skipping");
                    outcome.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(
                        student_id = %student.id,
                        hostel_id = %hostel.id,
                        "Failed to insert invoice: {}",
                        e
                    );
                    outcome.failed += 1;
                }
            }
        }

        billing_metrics::record_invoices_generated(&hostel.id, outcome.created);
        tracing::info!(
            hostel_id = %hostel.id,
            month,
            year,
            created = outcome.created,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Invoice generation finished"
        );

        Ok(outcome)
    }

    /// Generates invoices for a single hostel. Fails with `AlreadyGenerated`
    /// if any RENT invoice exists for the period.
    pub async fn generate_for_hostel(
        &self,
        hostel: &Hostel,
        month: i32,
        year: i32,
    ) -> Result<GenerationOutcome, AppError> {
        Self::validate_period(month, year)?;

        if !hostel.is_active {
            return Err(AppError::bad_request(format!(
                "Hostel {} is inactive",
                hostel.id
            )));
        }

        if self.already_generated(&hostel.id, month, year).await? {
            billing_metrics::record_generation_rejected(&hostel.id);
            return Err(PaymentError::AlreadyGenerated { month, year }.into());
        }

        self.issue_invoices(hostel, month, year).await
    }

    /// Generates invoices across several hostels. Inactive hostels are
    /// ignored. Fails with `AlreadyGenerated` only when every targeted
    /// hostel already had invoices for the period.
    pub async fn generate_for_hostels(
        &self,
        hostels: &[Hostel],
        month: i32,
        year: i32,
    ) -> Result<GenerationSummary, AppError> {
        Self::validate_period(month, year)?;

        let mut summary = GenerationSummary {
            month,
            year,
            outcomes: Vec::new(),
            already_generated: Vec::new(),
            failed: Vec::new(),
            total_created: 0,
        };

        let targets: Vec<&Hostel> = hostels.iter().filter(|h| h.is_active).collect();

        for hostel in &targets {
            match self.generate_for_hostel(hostel, month, year).await {
                Ok(outcome) => {
                    summary.total_created += outcome.created;
                    summary.outcomes.push(outcome);
                }
                Err(AppError::Conflict(_)) => summary.already_generated.push(hostel.id.clone()),
                Err(e) => {
                    tracing::error!(hostel_id = %hostel.id, "Invoice generation failed: {}", e);
                    summary.failed.push(HostelFailure {
                        hostel_id: hostel.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if !targets.is_empty() && summary.already_generated.len() == targets.len() {
            return Err(PaymentError::AlreadyGenerated { month, year }.into());
        }

        Ok(summary)
    }

    /// Validates the move against the current status, then writes it with
    /// the current status as a precondition. If another request changed the
    /// record in between, the error is reported against the fresh state.
    async fn apply_transition(
        &self,
        hostel_id: &str,
        payment_id: &str,
        update: PaymentUpdate,
    ) -> Result<Payment, AppError> {
        let current = self
            .store
            .get_payment(hostel_id, payment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Payment not found"))?;

        current.status.transition(update.status)?;

        match self
            .store
            .transition_payment(hostel_id, payment_id, current.status, &update)
            .await?
        {
            Some(updated) => {
                billing_metrics::record_payment_transition(updated.status.as_str());
                tracing::info!(
                    payment_id = %updated.id,
                    from = %current.status,
                    to = %updated.status,
                    "Payment status changed"
                );
                Ok(updated)
            }
            None => {
                let fresh = self
                    .store
                    .get_payment(hostel_id, payment_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Payment not found"))?;
                fresh.status.transition(update.status)?;
                Err(AppError::conflict("Payment was modified concurrently"))
            }
        }
    }

    /// UNPAID → PENDING with the student's proof.
    pub async fn submit_proof(
        &self,
        hostel_id: &str,
        payment_id: &str,
        proof: ProofSubmission,
    ) -> Result<Payment, AppError> {
        let mut update = PaymentUpdate::status(PaymentStatus::Pending);
        update.proof_image = Some(proof.proof_image);
        update.transaction_ref = proof.transaction_ref;
        update.method = proof.method;
        self.apply_transition(hostel_id, payment_id, update).await
    }

    /// PENDING → COMPLETED, recording who verified it and when.
    pub async fn verify(
        &self,
        ctx: &RequestContext,
        hostel_id: &str,
        payment_id: &str,
    ) -> Result<Payment, AppError> {
        let mut update = PaymentUpdate::status(PaymentStatus::Completed);
        update.is_verified = Some(true);
        update.verified_by = Some(ctx.user_id.clone());
        update.verified_at = Some(mongodb::bson::DateTime::now());
        self.apply_transition(hostel_id, payment_id, update).await
    }

    /// PENDING → FAILED.
    pub async fn reject(
        &self,
        ctx: &RequestContext,
        hostel_id: &str,
        payment_id: &str,
        reason: Option<String>,
    ) -> Result<Payment, AppError> {
        let mut update = PaymentUpdate::status(PaymentStatus::Failed);
        update.is_verified = Some(false);
        update.verified_by = Some(ctx.user_id.clone());
        update.verified_at = Some(mongodb::bson::DateTime::now());
        update.status_reason = reason;
        self.apply_transition(hostel_id, payment_id, update).await
    }

    /// COMPLETED → REFUNDED.
    pub async fn refund(
        &self,
        hostel_id: &str,
        payment_id: &str,
        reason: Option<String>,
    ) -> Result<Payment, AppError> {
        let mut update = PaymentUpdate::status(PaymentStatus::Refunded);
        update.status_reason = reason;
        self.apply_transition(hostel_id, payment_id, update).await
    }

    /// Records a one-off payment for a student of `hostel_id`.
    pub async fn record_payment(
        &self,
        ctx: &RequestContext,
        hostel_id: &str,
        input: ManualPayment,
    ) -> Result<Payment, AppError> {
        Self::validate_period(input.month, input.year)?;

        let student = self
            .store
            .get_student(hostel_id, &input.student_id)
            .await?
            .ok_or_else(|| AppError::not_found("Student not found"))?;

        let mut payment = Payment::new(NewPayment {
            hostel_id: hostel_id.to_string(),
            student_id: student.id,
            amount: input.amount,
            payment_type: input.payment_type,
            month: input.month,
            year: input.year,
            due_day: self.config.due_day,
            notes: input.notes,
        })?;
        payment.method = input.method;
        payment.transaction_ref = input.transaction_ref;

        if input.paid {
            payment.status = PaymentStatus::Completed;
            payment.is_verified = true;
            payment.verified_by = Some(ctx.user_id.clone());
            payment.verified_at = Some(mongodb::bson::DateTime::now());
        }

        self.store.insert_payment(&payment).await?;

        tracing::info!(
            payment_id = %payment.id,
            student_id = %payment.student_id,
            payment_type = ?payment.payment_type,
            status = %payment.status,
            "Payment recorded"
        );

        Ok(payment)
    }
}
