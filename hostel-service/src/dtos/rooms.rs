use crate::models::{Room, RoomType};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 20, message = "Room number is required"))]
    pub number: String,
    #[validate(range(min = 0, max = 200))]
    #[serde(default)]
    pub floor: i32,
    pub room_type: RoomType,
    #[validate(range(min = 1, max = 50, message = "Capacity must be between 1 and 50"))]
    pub capacity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoomRequest {
    #[validate(length(min = 1, max = 20))]
    pub number: Option<String>,
    #[validate(range(min = 0, max = 200))]
    pub floor: Option<i32>,
    pub room_type: Option<RoomType>,
    #[validate(range(min = 1, max = 50, message = "Capacity must be between 1 and 50"))]
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomResponse {
    pub id: String,
    pub hostel_id: String,
    pub number: String,
    pub floor: i32,
    pub room_type: RoomType,
    pub capacity: i32,
    pub occupied: i32,
    pub available_beds: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            available_beds: room.available_beds(),
            id: room.id,
            hostel_id: room.hostel_id,
            number: room.number,
            floor: room.floor,
            room_type: room.room_type,
            capacity: room.capacity,
            occupied: room.occupied,
            is_active: room.is_active,
            created_at: room.created_at.to_rfc3339(),
            updated_at: room.updated_at.to_rfc3339(),
        }
    }
}
