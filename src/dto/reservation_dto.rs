use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::time_slot::TimeSlot;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReservationRequest {
    pub interviewer_id: Uuid,
    pub time_slot: TimeSlot,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BlockRequest {
    pub time_slot: TimeSlot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub removed: u64,
}
