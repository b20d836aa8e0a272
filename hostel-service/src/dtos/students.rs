use crate::models::{Room, Student};
use crate::utils::validate_positive_amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub phone: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    #[validate(custom(function = "validate_positive_amount"))]
    pub monthly_fee: Decimal,
    /// Login identity of the student, for self-service access.
    pub user_id: Option<String>,
    /// Assign a bed straight away.
    pub room_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    #[validate(custom(function = "validate_positive_amount"))]
    pub monthly_fee: Option<Decimal>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignRoomRequest {
    #[validate(length(min = 1, message = "Room id is required"))]
    pub room_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StudentListParams {
    pub is_active: Option<bool>,
    pub room_id: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudentResponse {
    pub id: String,
    pub hostel_id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub monthly_fee: Decimal,
    pub room_id: Option<String>,
    pub room_number: Option<String>,
    pub is_active: bool,
    pub joined_at: String,
    pub left_at: Option<String>,
    pub updated_at: String,
}

impl StudentResponse {
    pub fn new(student: Student, room: Option<&Room>) -> Self {
        Self {
            id: student.id,
            hostel_id: student.hostel_id,
            user_id: student.user_id,
            name: student.name,
            email: student.email,
            phone: student.phone,
            guardian_name: student.guardian_name,
            guardian_phone: student.guardian_phone,
            monthly_fee: student.monthly_fee,
            room_id: student.room_id,
            room_number: room.map(|r| r.number.clone()),
            is_active: student.is_active,
            joined_at: student.joined_at.to_rfc3339(),
            left_at: student.left_at.map(|t| t.to_chrono().to_rfc3339()),
            updated_at: student.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudentListResponse {
    pub students: Vec<StudentResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}
