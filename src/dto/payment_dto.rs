use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::payment_session::CandidateSnapshot;
use crate::models::plan::PlanType;
use crate::models::time_slot::TimeSlot;
use crate::services::add_on_service::AddOnSelection;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CandidateDetails {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 5, max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub target_role: String,
    #[serde(default)]
    pub skill_categories: Vec<String>,
    #[serde(default)]
    pub specific_skills: Vec<String>,
    #[validate(range(min = 0, max = 60))]
    pub experience_years: i32,
    #[validate(length(max = 2048))]
    pub resume_url: Option<String>,
}

impl From<CandidateDetails> for CandidateSnapshot {
    fn from(c: CandidateDetails) -> Self {
        Self {
            full_name: c.full_name.trim().to_string(),
            email: c.email.trim().to_lowercase(),
            phone: c.phone,
            target_role: c.target_role,
            skill_categories: c.skill_categories,
            specific_skills: c.specific_skills,
            experience_years: c.experience_years,
            resume_url: c.resume_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePaymentSessionRequest {
    pub reservation_id: Uuid,
    pub interviewer_id: Uuid,
    pub time_slot: TimeSlot,
    pub plan_type: PlanType,
    #[validate(length(min = 1, max = 64))]
    pub coupon_code: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub add_ons: Vec<AddOnSelection>,
    #[validate(nested)]
    pub candidate: CandidateDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentSessionResponse {
    pub session_id: Uuid,
    pub order_id: String,
    pub payment_session_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub environment: String,
    pub payment_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ValidateCouponRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub plan_type: PlanType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutOrderResponse {
    pub order_id: String,
    pub payment_session_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub environment: String,
}
