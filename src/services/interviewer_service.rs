use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::models::interviewer::{AvailabilityWindow, Interviewer};
use crate::models::time_slot::{parse_weekday, weekday_name};
use chrono::Weekday;
use sqlx::PgPool;
use uuid::Uuid;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub(crate) const SELECT_INTERVIEWER: &str = r#"
    SELECT i.id, i.user_id, p.full_name, p.email, i.experience_years, i.skills,
           i.technologies, i.availability_days, i.time_slots, i.is_eligible,
           i.company, i.designation, i.created_at, i.updated_at
    FROM interviewers i
    JOIN profiles p ON p.id = i.user_id
"#;

/// Canonical weekday names (Monday first) and checked windows.
pub fn normalize_availability(
    days: &[String],
    windows: &[AvailabilityWindow],
) -> Result<(Vec<String>, Vec<AvailabilityWindow>)> {
    let mut parsed = BTreeSet::new();
    for day in days {
        let weekday = parse_weekday(day)
            .ok_or_else(|| Error::BadRequest(format!("Unknown weekday '{}'", day.trim())))?;
        parsed.insert(weekday.num_days_from_monday());
    }
    let days = parsed
        .into_iter()
        .map(|n| weekday_name(WEEK[n as usize]).to_string())
        .collect();

    let mut checked = Vec::with_capacity(windows.len());
    for w in windows {
        let weekday = w
            .weekday()
            .ok_or_else(|| Error::BadRequest(format!("Unknown weekday '{}'", w.day.trim())))?;
        let (start, end) = w.bounds().ok_or_else(|| {
            Error::BadRequest(format!(
                "Window {}-{} on {} must be HH:MM with start before end",
                w.start, w.end, w.day
            ))
        })?;
        checked.push(AvailabilityWindow {
            day: weekday_name(weekday).to_string(),
            start: start.format("%H:%M").to_string(),
            end: end.format("%H:%M").to_string(),
        });
    }
    Ok((days, checked))
}

#[derive(Clone)]
pub struct InterviewerService {
    pool: PgPool,
}

impl InterviewerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Interviewer> {
        sqlx::query_as::<_, Interviewer>(&format!("{} WHERE i.id = $1", SELECT_INTERVIEWER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Interviewer not found".to_string()))
    }

    pub async fn get_by_user(&self, user_id: Uuid) -> Result<Interviewer> {
        sqlx::query_as::<_, Interviewer>(&format!("{} WHERE i.user_id = $1", SELECT_INTERVIEWER))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::Forbidden("No interviewer profile for this account".to_string()))
    }

    pub async fn update_availability(
        &self,
        user_id: Uuid,
        days: &[String],
        windows: &[AvailabilityWindow],
    ) -> Result<Interviewer> {
        let (days, windows) = normalize_availability(days, windows)?;
        let updated = sqlx::query(
            r#"
            UPDATE interviewers
            SET availability_days = $2, time_slots = $3, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(&days)
        .bind(sqlx::types::Json(&windows))
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::Forbidden("No interviewer profile for this account".to_string()));
        }
        tracing::info!(user_id = %user_id, days = ?days, windows = windows.len(), "availability updated");
        self.get_by_user(user_id).await
    }

    pub async fn set_eligibility(&self, id: Uuid, is_eligible: bool) -> Result<Interviewer> {
        let updated = sqlx::query(
            r#"UPDATE interviewers SET is_eligible = $2, updated_at = NOW() WHERE id = $1"#,
        )
        .bind(id)
        .bind(is_eligible)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::NotFound("Interviewer not found".to_string()));
        }
        self.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(day: &str, start: &str, end: &str) -> AvailabilityWindow {
        AvailabilityWindow {
            day: day.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    #[test]
    fn days_are_canonical_and_ordered() {
        let (days, _) = normalize_availability(
            &["fri".into(), "Monday".into(), "MON".into(), " wednesday ".into()],
            &[],
        )
        .unwrap();
        assert_eq!(days, vec!["Monday", "Wednesday", "Friday"]);
    }

    #[test]
    fn windows_are_normalized() {
        let (_, windows) =
            normalize_availability(&[], &[window("tue", "9:00", "12:30:00")]).unwrap();
        assert_eq!(windows, vec![window("Tuesday", "09:00", "12:30")]);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            normalize_availability(&["Funday".into()], &[]),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            normalize_availability(&[], &[window("Monday", "17:00", "09:00")]),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            normalize_availability(&[], &[window("Monday", "noon", "13:00")]),
            Err(Error::BadRequest(_))
        ));
    }
}
