use crate::models::Reward;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRewardRequest {
    #[validate(length(min = 1, message = "Student id is required"))]
    pub student_id: String,
    #[validate(range(min = 1, max = 10000, message = "Points must be between 1 and 10000"))]
    pub points: i32,
    #[validate(length(min = 1, max = 500, message = "Reason is required"))]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct RewardListParams {
    pub student_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RewardResponse {
    pub id: String,
    pub hostel_id: String,
    pub student_id: String,
    pub points: i32,
    pub reason: String,
    pub awarded_by: String,
    pub created_at: String,
}

impl From<Reward> for RewardResponse {
    fn from(reward: Reward) -> Self {
        Self {
            id: reward.id,
            hostel_id: reward.hostel_id,
            student_id: reward.student_id,
            points: reward.points,
            reason: reward.reason,
            awarded_by: reward.awarded_by,
            created_at: reward.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RewardListResponse {
    pub rewards: Vec<RewardResponse>,
    pub total_points: i64,
}
