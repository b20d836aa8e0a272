use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    Single,
    Double,
    Dormitory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "_id")]
    pub id: String,
    pub hostel_id: String,
    pub number: String,
    pub floor: i32,
    pub room_type: RoomType,
    /// Total beds.
    pub capacity: i32,
    /// Beds currently assigned; never above `capacity`.
    pub occupied: i32,
    pub is_active: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn new(
        hostel_id: String,
        number: String,
        floor: i32,
        room_type: RoomType,
        capacity: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            hostel_id,
            number,
            floor,
            room_type,
            capacity,
            occupied: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn available_beds(&self) -> i32 {
        (self.capacity - self.occupied).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.occupied >= self.capacity
    }
}
