use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::time_slot::TimeSlot;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RescheduleRequest {
    pub time_slot: TimeSlot,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CancelRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}
