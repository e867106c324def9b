use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::time_slot::TimeSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    Rescheduled,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::Rescheduled => "rescheduled",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "scheduled" => Some(InterviewStatus::Scheduled),
            "rescheduled" => Some(InterviewStatus::Rescheduled),
            "completed" => Some(InterviewStatus::Completed),
            "cancelled" => Some(InterviewStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_upcoming(&self) -> bool {
        matches!(self, InterviewStatus::Scheduled | InterviewStatus::Rescheduled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub interviewer_id: Uuid,
    pub payment_session_id: Option<Uuid>,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub target_role: String,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: String,
    pub plan_type: String,
    pub selected_add_ons: JsonValue,
    pub meeting_link: Option<String>,
    pub resume_url: Option<String>,
    pub reschedule_count: i32,
    pub cancellation_reason: Option<String>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub feedback_requested_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Interview {
    pub fn status(&self) -> Option<InterviewStatus> {
        InterviewStatus::parse(&self.status)
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.scheduled_time + chrono::Duration::minutes(self.duration_minutes as i64)
    }

    /// The booked slot in the scheduling time zone.
    pub fn local_slot(&self, offset: FixedOffset) -> Option<TimeSlot> {
        let local = self.scheduled_time.with_timezone(&offset).naive_local();
        TimeSlot::starting_at(local.date(), local.time(), self.duration_minutes as i64).ok()
    }
}

/// Interview joined with the interviewer's contact details, as used for email.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewWithParties {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub interview: Interview,
    pub interviewer_name: String,
    pub interviewer_email: String,
    pub interviewer_user_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn local_slot_uses_schedule_offset() {
        let interview = Interview {
            id: Uuid::nil(),
            interviewer_id: Uuid::nil(),
            payment_session_id: None,
            candidate_id: Uuid::nil(),
            candidate_name: "Priya".into(),
            candidate_email: "priya@example.com".into(),
            target_role: "Backend Engineer".into(),
            scheduled_time: Utc.with_ymd_and_hms(2026, 10, 20, 4, 30, 0).unwrap(),
            duration_minutes: 60,
            status: "scheduled".into(),
            plan_type: "pro".into(),
            selected_add_ons: serde_json::json!([]),
            meeting_link: None,
            resume_url: None,
            reschedule_count: 0,
            cancellation_reason: None,
            reminder_sent_at: None,
            feedback_requested_at: None,
            created_at: None,
            updated_at: None,
        };
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        let slot = interview.local_slot(ist).unwrap();
        assert_eq!(slot.label(), "Tuesday, 20/10/2026 10:00-11:00");
        assert_eq!(interview.ends_at(), Utc.with_ymd_and_hms(2026, 10, 20, 5, 30, 0).unwrap());
        assert_eq!(interview.status(), Some(InterviewStatus::Scheduled));
    }
}
