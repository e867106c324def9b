use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::interviewer::AvailabilityWindow;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateAvailabilityRequest {
    #[validate(length(max = 7))]
    pub availability_days: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub time_slots: Vec<AvailabilityWindow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EligibilityRequest {
    pub is_eligible: bool,
}
