use crate::models::{Role, User};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateManagerRequest {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ManagerResponse {
    pub id: String,
    pub hostel_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: String,
}

impl From<User> for ManagerResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            hostel_id: user.hostel_id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            is_active: user.is_active,
            created_by: user.created_by,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}
