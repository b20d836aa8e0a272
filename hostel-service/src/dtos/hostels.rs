use crate::models::Hostel;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateHostelRequest {
    #[validate(length(min = 1, max = 120, message = "Hostel name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    pub phone: Option<String>,
    /// Admins may create a hostel on behalf of an owner.
    pub owner_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateHostelRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub address: Option<String>,
    #[validate(length(min = 1))]
    pub city: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct HostelListParams {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HostelResponse {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Hostel> for HostelResponse {
    fn from(hostel: Hostel) -> Self {
        Self {
            id: hostel.id,
            owner_id: hostel.owner_id,
            name: hostel.name,
            address: hostel.address,
            city: hostel.city,
            phone: hostel.phone,
            is_active: hostel.is_active,
            created_at: hostel.created_at.to_rfc3339(),
            updated_at: hostel.updated_at.to_rfc3339(),
        }
    }
}
