use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A residence property; the tenant boundary for everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hostel {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub is_active: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Hostel {
    pub fn new(
        owner_id: String,
        name: String,
        address: String,
        city: String,
        phone: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            name,
            address,
            city,
            phone,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Filter for listing hostels.
#[derive(Debug, Clone, Default)]
pub struct HostelFilter {
    pub owner_id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub active_only: bool,
}
