use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const REVIEW_STATUSES: [&str; 4] = ["pending", "processing", "completed", "failed"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeReview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub target_role: Option<String>,
    pub resume_url: String,
    pub status: String,
    pub report_url: Option<String>,
    pub reviewer_notes: Option<String>,
    pub amount: Decimal,
    pub payment_status: String,
    pub provider_order_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
