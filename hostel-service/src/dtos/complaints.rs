use crate::models::{Complaint, ComplaintCategory, ComplaintPriority, ComplaintStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateComplaintRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 4000, message = "Description is required"))]
    pub description: String,
    pub category: ComplaintCategory,
    pub priority: Option<ComplaintPriority>,
    /// Staff filing on a student's behalf; ignored for student callers.
    pub student_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateComplaintRequest {
    pub status: Option<ComplaintStatus>,
    pub priority: Option<ComplaintPriority>,
    #[validate(length(max = 4000))]
    pub resolution: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ComplaintListParams {
    pub status: Option<ComplaintStatus>,
    pub student_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComplaintResponse {
    pub id: String,
    pub hostel_id: String,
    pub student_id: String,
    pub title: String,
    pub description: String,
    pub category: ComplaintCategory,
    pub priority: ComplaintPriority,
    pub status: ComplaintStatus,
    pub resolution: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Complaint> for ComplaintResponse {
    fn from(complaint: Complaint) -> Self {
        Self {
            id: complaint.id,
            hostel_id: complaint.hostel_id,
            student_id: complaint.student_id,
            title: complaint.title,
            description: complaint.description,
            category: complaint.category,
            priority: complaint.priority,
            status: complaint.status,
            resolution: complaint.resolution,
            resolved_by: complaint.resolved_by,
            resolved_at: complaint.resolved_at.map(|t| t.to_chrono().to_rfc3339()),
            created_at: complaint.created_at.to_rfc3339(),
            updated_at: complaint.updated_at.to_rfc3339(),
        }
    }
}
