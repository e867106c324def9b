use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::time_slot::TimeSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Completed) | (Pending, Failed)
                | (Processing, Completed) | (Processing, Failed)
        )
    }

    /// States a row must be in for a guarded update into `self`.
    pub fn predecessors(&self) -> Vec<&'static str> {
        [PaymentStatus::Pending, PaymentStatus::Processing]
            .into_iter()
            .filter(|from| from.can_transition_to(*self))
            .map(|from| from.as_str())
            .collect()
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "active" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "completed" | "success" | "paid" => Ok(PaymentStatus::Completed),
            "failed" | "failure" | "user_dropped" | "cancelled" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub candidate_data: sqlx::types::Json<CandidateSnapshot>,
    pub plan_type: String,
    pub base_amount: Decimal,
    pub discount_amount: Decimal,
    pub coupon_code: Option<String>,
    pub add_ons_total: Decimal,
    pub amount: Decimal,
    pub currency: String,
    pub payment_status: String,
    pub provider_order_id: Option<String>,
    pub provider_payment_id: Option<String>,
    pub provider_session_id: Option<String>,
    pub interviewer_id: Uuid,
    pub matched_interviewer: JsonValue,
    pub reservation_id: Option<Uuid>,
    pub slot_date: NaiveDate,
    pub slot_start: NaiveTime,
    pub slot_end: NaiveTime,
    pub selected_add_ons: JsonValue,
    pub interview_matched: bool,
    pub interview_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PaymentSession {
    pub fn status(&self) -> Result<PaymentStatus, String> {
        self.payment_status.parse()
    }

    pub fn time_slot(&self) -> TimeSlot {
        TimeSlot {
            date: self.slot_date,
            start: self.slot_start,
            end: self.slot_end,
        }
    }
}

/// What the candidate told us at checkout, frozen on the session row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateSnapshot {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub target_role: String,
    #[serde(default)]
    pub skill_categories: Vec<String>,
    #[serde(default)]
    pub specific_skills: Vec<String>,
    pub experience_years: i32,
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSessionView {
    pub id: Uuid,
    pub payment_status: String,
    pub amount: Decimal,
    pub currency: String,
    pub plan_type: String,
    pub provider_order_id: Option<String>,
    pub time_slot: TimeSlot,
    pub interview_matched: bool,
    pub interview_id: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<PaymentSession> for PaymentSessionView {
    fn from(s: PaymentSession) -> Self {
        Self {
            id: s.id,
            time_slot: s.time_slot(),
            payment_status: s.payment_status,
            amount: s.amount,
            currency: s.currency,
            plan_type: s.plan_type,
            provider_order_id: s.provider_order_id,
            interview_matched: s.interview_matched,
            interview_id: s.interview_id,
            updated_at: s.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PaymentStatus::*;
    use super::*;

    #[test]
    fn terminal_states_never_move() {
        for next in [Pending, Processing, Completed, Failed] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
    }

    #[test]
    fn forward_transitions_are_allowed() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Completed));
        assert!(!Processing.can_transition_to(Pending));
    }

    #[test]
    fn predecessors_feed_guarded_updates() {
        assert_eq!(Completed.predecessors(), vec!["pending", "processing"]);
        assert_eq!(Processing.predecessors(), vec!["pending"]);
        assert!(Pending.predecessors().is_empty());
    }

    #[test]
    fn parses_provider_vocabulary() {
        assert_eq!("SUCCESS".parse::<PaymentStatus>(), Ok(Completed));
        assert_eq!("USER_DROPPED".parse::<PaymentStatus>(), Ok(Failed));
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }
}
