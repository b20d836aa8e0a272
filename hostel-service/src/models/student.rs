use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: String,
    pub hostel_id: String,
    /// Identity of the student's own login, matched against `X-User-ID`.
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    /// Sizes generated rent invoices.
    pub monthly_fee: Decimal,
    pub room_id: Option<String>,
    pub is_active: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<mongodb::bson::DateTime>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a student.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub hostel_id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub monthly_fee: Decimal,
}

impl Student {
    pub fn new(input: NewStudent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            hostel_id: input.hostel_id,
            user_id: input.user_id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            guardian_name: input.guardian_name,
            guardian_phone: input.guardian_phone,
            monthly_fee: input.monthly_fee,
            room_id: None,
            is_active: true,
            joined_at: now,
            left_at: None,
            updated_at: now,
        }
    }
}

/// Filter for listing students in one hostel.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub is_active: Option<bool>,
    pub room_id: Option<String>,
    pub user_id: Option<String>,
}
