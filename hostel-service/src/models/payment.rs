//! Payment records and their status lifecycle.
//!
//! ```text
//! UNPAID --proof--> PENDING --verify--> COMPLETED --refund--> REFUNDED
//!                      \--reject--> FAILED
//! ```
//!
//! OVERDUE is never stored: an UNPAID record whose due date has passed reads
//! as OVERDUE through [`Payment::effective_status`].

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Rent,
    Security,
    Fine,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    MobileMoney,
    Card,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Completed,
    Failed,
    Refunded,
    /// Derived label for UNPAID records past their due date.
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Overdue => "OVERDUE",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }

    /// Outstanding statuses count towards pending dues.
    pub fn is_outstanding(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Unpaid | PaymentStatus::Pending | PaymentStatus::Overdue
        )
    }

    /// Validates a move from `self` to `to` and returns the new status.
    pub fn transition(self, to: PaymentStatus) -> Result<PaymentStatus, PaymentError> {
        // Overdue is a view over Unpaid
        let from = match self {
            PaymentStatus::Overdue => PaymentStatus::Unpaid,
            other => other,
        };

        match (from, to) {
            (PaymentStatus::Unpaid, PaymentStatus::Pending)
            | (PaymentStatus::Pending, PaymentStatus::Completed)
            | (PaymentStatus::Pending, PaymentStatus::Failed)
            | (PaymentStatus::Completed, PaymentStatus::Refunded) => Ok(to),
            (PaymentStatus::Completed, PaymentStatus::Completed) => {
                Err(PaymentError::AlreadyVerified)
            }
            (PaymentStatus::Unpaid, PaymentStatus::Completed)
            | (PaymentStatus::Unpaid, PaymentStatus::Failed) => Err(PaymentError::NotSubmitted),
            _ => Err(PaymentError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UNPAID" => Ok(PaymentStatus::Unpaid),
            "PENDING" => Ok(PaymentStatus::Pending),
            "COMPLETED" => Ok(PaymentStatus::Completed),
            "FAILED" => Ok(PaymentStatus::Failed),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            "OVERDUE" => Ok(PaymentStatus::Overdue),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Invoices already exist for {month}/{year}")]
    AlreadyGenerated { month: i32, year: i32 },

    #[error("Payment is already verified")]
    AlreadyVerified,

    #[error("Payment has no submitted proof; it cannot be verified")]
    NotSubmitted,

    #[error("Cannot move payment from {from} to {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Invalid billing period {month}/{year}")]
    InvalidPeriod { month: i32, year: i32 },
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotSubmitted | PaymentError::InvalidPeriod { .. } => {
                AppError::BadRequest(anyhow::Error::new(err))
            }
            PaymentError::AlreadyGenerated { .. }
            | PaymentError::AlreadyVerified
            | PaymentError::InvalidTransition { .. } => AppError::Conflict(anyhow::Error::new(err)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: String,
    pub hostel_id: String,
    pub student_id: String,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub method: Option<PaymentMethod>,
    pub month: i32,
    pub year: i32,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
    pub receipt_number: String,
    pub proof_image: Option<String>,
    pub transaction_ref: Option<String>,
    pub is_verified: bool,
    pub verified_by: Option<String>,
    pub verified_at: Option<mongodb::bson::DateTime>,
    pub status_reason: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Input for a new payment obligation.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub hostel_id: String,
    pub student_id: String,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub month: i32,
    pub year: i32,
    pub due_day: u32,
    pub notes: Option<String>,
}

impl Payment {
    pub fn new(input: NewPayment) -> Result<Self, PaymentError> {
        let due_date = due_date_for(input.month, input.year, input.due_day).ok_or(
            PaymentError::InvalidPeriod {
                month: input.month,
                year: input.year,
            },
        )?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            hostel_id: input.hostel_id,
            student_id: input.student_id,
            amount: input.amount,
            payment_type: input.payment_type,
            method: None,
            month: input.month,
            year: input.year,
            due_date,
            status: PaymentStatus::Unpaid,
            receipt_number: generate_receipt_number(input.month, input.year),
            proof_image: None,
            transaction_ref: None,
            is_verified: false,
            verified_by: None,
            verified_at: None,
            status_reason: None,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// Stored status, except UNPAID past its due date reads as OVERDUE.
    pub fn effective_status(&self, today: NaiveDate) -> PaymentStatus {
        if self.status == PaymentStatus::Unpaid && today > self.due_date {
            PaymentStatus::Overdue
        } else {
            self.status
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.effective_status(today) == PaymentStatus::Overdue
    }
}

/// Filter for listing payments. `hostel_id` is always applied by the
/// store; `None` fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub hostel_id: Option<String>,
    pub student_id: Option<String>,
    /// `Overdue` selects UNPAID rows due before `today`.
    pub status: Option<PaymentStatus>,
    pub payment_type: Option<PaymentType>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub today: Option<NaiveDate>,
}

/// Fields written by a status transition.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub method: Option<PaymentMethod>,
    pub proof_image: Option<String>,
    pub transaction_ref: Option<String>,
    pub is_verified: Option<bool>,
    pub verified_by: Option<String>,
    pub verified_at: Option<mongodb::bson::DateTime>,
    pub status_reason: Option<String>,
}

impl PaymentUpdate {
    pub fn status(status: PaymentStatus) -> Self {
        Self {
            status,
            method: None,
            proof_image: None,
            transaction_ref: None,
            is_verified: None,
            verified_by: None,
            verified_at: None,
            status_reason: None,
        }
    }

    /// Applies the update in place; used by the in-memory store.
    pub fn apply(&self, payment: &mut Payment) {
        payment.status = self.status;
        if let Some(method) = self.method {
            payment.method = Some(method);
        }
        if let Some(ref proof) = self.proof_image {
            payment.proof_image = Some(proof.clone());
        }
        if let Some(ref reference) = self.transaction_ref {
            payment.transaction_ref = Some(reference.clone());
        }
        if let Some(verified) = self.is_verified {
            payment.is_verified = verified;
        }
        if let Some(ref by) = self.verified_by {
            payment.verified_by = Some(by.clone());
        }
        if let Some(at) = self.verified_at {
            payment.verified_at = Some(at);
        }
        if let Some(ref reason) = self.status_reason {
            payment.status_reason = Some(reason.clone());
        }
        payment.updated_at = Utc::now();
    }
}

/// Due date for a billing month. `due_day` is clamped to 1..=28 so every
/// month has it.
pub fn due_date_for(month: i32, year: i32, due_day: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month as u32, due_day.clamp(1, 28))
}

/// `RCP-YYYYMM-XXXXXXXXXX`, uniqueness backed by an index.
pub fn generate_receipt_number(month: i32, year: i32) -> String {
    let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("RCP-{:04}{:02}-{}", year, month, &suffix[..10])
}

/// Current (month, year) in UTC.
pub fn current_period() -> (i32, i32) {
    let today = Utc::now().date_naive();
    (today.month() as i32, today.year())
}
