use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::time_slot::TimeSlot;
use crate::services::matching_service::CandidateProfile;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchRequest {
    #[validate(range(min = 0, max = 60))]
    pub experience_years: i32,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub skill_categories: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub specific_skills: Vec<String>,
    pub time_slot: TimeSlot,
    #[validate(length(min = 1, max = 200))]
    pub target_role: String,
}

impl From<&MatchRequest> for CandidateProfile {
    fn from(req: &MatchRequest) -> Self {
        Self {
            experience_years: req.experience_years,
            skill_categories: req.skill_categories.clone(),
            specific_skills: req.specific_skills.clone(),
            requested_slot: req.time_slot,
        }
    }
}
