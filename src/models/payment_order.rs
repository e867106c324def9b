use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const KIND_INTERVIEW: &str = "interview";
pub const KIND_RESUME_REVIEW: &str = "resume_review";

/// Explicit link from a provider order id to the local row it pays for.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentOrder {
    pub provider_order_id: String,
    pub kind: String,
    pub local_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
}

pub fn interview_order_id(session_id: Uuid) -> String {
    format!("ORDER_{}", session_id)
}

pub fn resume_review_order_id(review_id: Uuid, at: DateTime<Utc>) -> String {
    format!("RR_{}_{}", review_id, at.timestamp())
}
