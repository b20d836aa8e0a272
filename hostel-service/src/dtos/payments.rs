use crate::models::{Payment, PaymentMethod, PaymentStatus, PaymentType, Room, Student};
use crate::utils::validate_positive_amount;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateInvoicesRequest {
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: i32,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    #[validate(length(min = 1, message = "Student id is required"))]
    pub student_id: String,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    pub payment_type: PaymentType,
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: i32,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: i32,
    pub method: Option<PaymentMethod>,
    pub transaction_ref: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    /// Record as collected and verified immediately.
    #[serde(default)]
    pub paid: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitProofRequest {
    #[validate(length(min = 1, max = 1024, message = "Proof image reference is required"))]
    pub proof_image: String,
    #[validate(length(max = 128))]
    pub transaction_ref: Option<String>,
    pub method: Option<PaymentMethod>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct StatusReasonRequest {
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<PaymentStatus>,
    pub payment_type: Option<PaymentType>,
    pub student_id: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: String,
    pub hostel_id: String,
    pub student_id: String,
    pub student_name: Option<String>,
    pub room_number: Option<String>,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub method: Option<PaymentMethod>,
    pub month: i32,
    pub year: i32,
    pub due_date: NaiveDate,
    /// Stored status.
    pub status: PaymentStatus,
    /// Status as of today; UNPAID past the due date reads OVERDUE.
    pub effective_status: PaymentStatus,
    pub receipt_number: String,
    pub proof_image: Option<String>,
    pub transaction_ref: Option<String>,
    pub is_verified: bool,
    pub verified_by: Option<String>,
    pub verified_at: Option<String>,
    pub status_reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PaymentResponse {
    pub fn new(
        payment: Payment,
        today: NaiveDate,
        student: Option<&Student>,
        room: Option<&Room>,
    ) -> Self {
        Self {
            effective_status: payment.effective_status(today),
            id: payment.id,
            hostel_id: payment.hostel_id,
            student_id: payment.student_id,
            student_name: student.map(|s| s.name.clone()),
            room_number: room.map(|r| r.number.clone()),
            amount: payment.amount,
            payment_type: payment.payment_type,
            method: payment.method,
            month: payment.month,
            year: payment.year,
            due_date: payment.due_date,
            status: payment.status,
            receipt_number: payment.receipt_number,
            proof_image: payment.proof_image,
            transaction_ref: payment.transaction_ref,
            is_verified: payment.is_verified,
            verified_by: payment.verified_by,
            verified_at: payment.verified_at.map(|t| t.to_chrono().to_rfc3339()),
            status_reason: payment.status_reason,
            notes: payment.notes,
            created_at: payment.created_at.to_rfc3339(),
            updated_at: payment.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentListResponse {
    pub payments: Vec<PaymentResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPayment;

    #[test]
    fn test_generate_request_bounds() {
        let ok = GenerateInvoicesRequest {
            month: 3,
            year: 2025,
        };
        assert!(ok.validate().is_ok());
        let bad = GenerateInvoicesRequest {
            month: 13,
            year: 2025,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_amount_accepts_json_number() {
        let req: CreatePaymentRequest = serde_json::from_value(serde_json::json!({
            "student_id": "s1",
            "amount": 1500,
            "payment_type": "FINE",
            "month": 3,
            "year": 2025
        }))
        .unwrap();
        assert_eq!(req.amount, Decimal::from(1500));
        assert!(!req.paid);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_response_carries_effective_status() {
        let payment = Payment::new(NewPayment {
            hostel_id: "h1".to_string(),
            student_id: "s1".to_string(),
            amount: Decimal::from(5000),
            payment_type: PaymentType::Rent,
            month: 3,
            year: 2025,
            due_day: 10,
            notes: None,
        })
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let response = PaymentResponse::new(payment, today, None, None);
        assert_eq!(response.status, PaymentStatus::Unpaid);
        assert_eq!(response.effective_status, PaymentStatus::Overdue);
    }
}
