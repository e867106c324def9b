use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::time_slot::{parse_clock, parse_weekday};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Interviewer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub experience_years: i32,
    pub skills: Vec<String>,
    pub technologies: Vec<String>,
    pub availability_days: Vec<String>,
    pub time_slots: sqlx::types::Json<Vec<AvailabilityWindow>>,
    pub is_eligible: bool,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A recurring weekly window in which the interviewer takes sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub day: String,
    pub start: String,
    pub end: String,
}

impl AvailabilityWindow {
    pub fn weekday(&self) -> Option<Weekday> {
        parse_weekday(&self.day)
    }

    pub fn bounds(&self) -> Option<(NaiveTime, NaiveTime)> {
        let start = parse_clock(&self.start).ok()?;
        let end = parse_clock(&self.end).ok()?;
        (start < end).then_some((start, end))
    }
}

impl Interviewer {
    pub fn is_available_on(&self, day: Weekday) -> bool {
        self.availability_days
            .iter()
            .any(|d| parse_weekday(d) == Some(day))
    }

    /// Windows declared for `day`, falling back to the 09:00-17:00 work day.
    pub fn work_windows(&self, day: Weekday) -> Vec<(NaiveTime, NaiveTime)> {
        let declared: Vec<_> = self
            .time_slots
            .iter()
            .filter(|w| w.weekday() == Some(day))
            .filter_map(|w| w.bounds())
            .collect();
        if declared.is_empty() {
            vec![default_work_window()]
        } else {
            declared
        }
    }

    /// Skills and technologies as one list for fuzzy matching.
    pub fn expertise(&self) -> impl Iterator<Item = &String> {
        self.skills.iter().chain(self.technologies.iter())
    }
}

pub fn default_work_window() -> (NaiveTime, NaiveTime) {
    (
        NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
        NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewerSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub experience_years: i32,
    pub skills: Vec<String>,
    pub technologies: Vec<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
}

impl From<&Interviewer> for InterviewerSummary {
    fn from(i: &Interviewer) -> Self {
        Self {
            id: i.id,
            user_id: i.user_id,
            full_name: i.full_name.clone(),
            experience_years: i.experience_years,
            skills: i.skills.clone(),
            technologies: i.technologies.clone(),
            company: i.company.clone(),
            designation: i.designation.clone(),
        }
    }
}
