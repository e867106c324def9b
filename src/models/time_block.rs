use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::time_slot::TimeSlot;

pub const REASON_TEMPORARY: &str = "temporary_reservation";
pub const REASON_INTERVIEW: &str = "interview_scheduled";
pub const REASON_MANUAL: &str = "manual";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimeBlock {
    pub id: Uuid,
    pub interviewer_id: Uuid,
    pub blocked_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_temporary: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub block_reason: String,
    pub interview_id: Option<Uuid>,
    pub reserved_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

impl TimeBlock {
    /// Expired temporary rows no longer hold the calendar.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_temporary || self.expires_at.map(|exp| exp > now).unwrap_or(false)
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            date: self.blocked_date,
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn blocks(&self, slot: &TimeSlot, now: DateTime<Utc>) -> bool {
        self.is_active(now) && self.slot().overlaps(slot)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub reservation_id: Uuid,
    pub interviewer_id: Uuid,
    pub time_slot: TimeSlot,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<TimeBlock> for ReservationResponse {
    fn from(block: TimeBlock) -> Self {
        Self {
            reservation_id: block.id,
            interviewer_id: block.interviewer_id,
            time_slot: block.slot(),
            expires_at: block.expires_at,
        }
    }
}
