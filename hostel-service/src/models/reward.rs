use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Points awarded to a student by hostel staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    #[serde(rename = "_id")]
    pub id: String,
    pub hostel_id: String,
    pub student_id: String,
    pub points: i32,
    pub reason: String,
    pub awarded_by: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Reward {
    pub fn new(
        hostel_id: String,
        student_id: String,
        points: i32,
        reason: String,
        awarded_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            hostel_id,
            student_id,
            points,
            reason,
            awarded_by,
            created_at: Utc::now(),
        }
    }
}
