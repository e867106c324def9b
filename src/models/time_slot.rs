//! Structured interview time slot.
//!
//! A slot is a local date plus a start/end time in the scheduling time zone.
//! Its display form is `"<Weekday>, DD/MM/YYYY HH:MM-HH:MM"`, which is also the
//! only textual form accepted by [`TimeSlot::from_str`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TimeSlotInput", into = "TimeSlotView")]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeSlotError {
    #[error("time slot must look like 'Monday, 20/10/2025 10:00-11:00'")]
    Format,
    #[error("invalid date '{0}'")]
    Date(String),
    #[error("invalid time '{0}'")]
    Time(String),
    #[error("weekday '{given}' does not match date (expected {expected})")]
    WeekdayMismatch { given: String, expected: String },
    #[error("slot end must be after its start")]
    EmptyRange,
}

impl TimeSlot {
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Self, TimeSlotError> {
        if end <= start {
            return Err(TimeSlotError::EmptyRange);
        }
        Ok(Self { date, start, end })
    }

    /// Slot starting at `start` and lasting `minutes`, without crossing midnight.
    pub fn starting_at(date: NaiveDate, start: NaiveTime, minutes: i64) -> Result<Self, TimeSlotError> {
        let (end, wrapped) = start.overflowing_add_signed(Duration::minutes(minutes));
        if wrapped != 0 {
            return Err(TimeSlotError::EmptyRange);
        }
        Self::new(date, start, end)
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.date == other.date && self.start < other.end && other.start < self.end
    }

    /// Whether the slot lies entirely inside `[from, to]` on its date.
    pub fn within(&self, from: NaiveTime, to: NaiveTime) -> bool {
        self.start >= from && self.end <= to
    }

    pub fn starts_at(&self, offset: FixedOffset) -> DateTime<Utc> {
        local_to_utc(self.date.and_time(self.start), offset)
    }

    pub fn ends_at(&self, offset: FixedOffset) -> DateTime<Utc> {
        local_to_utc(self.date.and_time(self.end), offset)
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

fn local_to_utc(local: chrono::NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    let utc_naive = local - Duration::seconds(offset.local_minus_utc() as i64);
    DateTime::<Utc>::from_naive_utc_and_offset(utc_naive, Utc)
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parses full or abbreviated English weekday names, case-insensitively.
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    raw.trim().parse::<Weekday>().ok()
}

pub fn parse_clock(raw: &str) -> Result<NaiveTime, TimeSlotError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| TimeSlotError::Time(raw.to_string()))
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} {}-{}",
            weekday_name(self.weekday()),
            self.date.format("%d/%m/%Y"),
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
        )
    }
}

impl FromStr for TimeSlot {
    type Err = TimeSlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day, rest) = s.trim().split_once(',').ok_or(TimeSlotError::Format)?;
        let (date_raw, range) = rest.trim().split_once(' ').ok_or(TimeSlotError::Format)?;
        let (start_raw, end_raw) = range.trim().split_once('-').ok_or(TimeSlotError::Format)?;

        let date = NaiveDate::parse_from_str(date_raw.trim(), "%d/%m/%Y")
            .map_err(|_| TimeSlotError::Date(date_raw.trim().to_string()))?;
        let start = parse_clock(start_raw)?;
        let end = parse_clock(end_raw)?;

        let expected = date.weekday();
        match parse_weekday(day) {
            Some(given) if given == expected => {}
            _ => {
                return Err(TimeSlotError::WeekdayMismatch {
                    given: day.trim().to_string(),
                    expected: weekday_name(expected).to_string(),
                })
            }
        }

        TimeSlot::new(date, start, end)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimeSlotInput {
    Text(String),
    Fields {
        date: NaiveDate,
        start_time: String,
        end_time: String,
    },
}

impl TryFrom<TimeSlotInput> for TimeSlot {
    type Error = TimeSlotError;

    fn try_from(input: TimeSlotInput) -> Result<Self, Self::Error> {
        match input {
            TimeSlotInput::Text(text) => text.parse(),
            TimeSlotInput::Fields {
                date,
                start_time,
                end_time,
            } => TimeSlot::new(date, parse_clock(&start_time)?, parse_clock(&end_time)?),
        }
    }
}

#[derive(Debug, Serialize)]
struct TimeSlotView {
    date: NaiveDate,
    start_time: String,
    end_time: String,
    label: String,
}

impl From<TimeSlot> for TimeSlotView {
    fn from(slot: TimeSlot) -> Self {
        Self {
            date: slot.date,
            start_time: slot.start.format("%H:%M").to_string(),
            end_time: slot.end.format("%H:%M").to_string(),
            label: slot.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(text: &str) -> TimeSlot {
        text.parse().expect("valid slot")
    }

    #[test]
    fn parses_legacy_format() {
        let s = slot("Tuesday, 20/10/2026 10:00-11:00");
        assert_eq!(s.date, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(s.start, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(s.end, NaiveTime::from_hms_opt(11, 0, 0).unwrap());
        assert_eq!(s.duration_minutes(), 60);
    }

    #[test]
    fn display_reparses_identically() {
        let s = TimeSlot::starting_at(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            60,
        )
        .unwrap();
        assert_eq!(s.to_string(), "Sunday, 01/03/2026 09:00-10:00");
        assert_eq!(slot(&s.to_string()), s);
    }

    #[test]
    fn rejects_wrong_weekday() {
        let err = "Monday, 20/10/2026 10:00-11:00".parse::<TimeSlot>().unwrap_err();
        assert!(matches!(err, TimeSlotError::WeekdayMismatch { .. }));
    }

    #[test]
    fn rejects_inverted_or_malformed_ranges() {
        assert_eq!(
            "Tuesday, 20/10/2026 11:00-10:00".parse::<TimeSlot>(),
            Err(TimeSlotError::EmptyRange)
        );
        assert_eq!("Tuesday 20/10/2026".parse::<TimeSlot>(), Err(TimeSlotError::Format));
        assert!(matches!(
            "Tuesday, 32/10/2026 10:00-11:00".parse::<TimeSlot>(),
            Err(TimeSlotError::Date(_))
        ));
        assert!(matches!(
            "Tuesday, 20/10/2026 25:00-26:00".parse::<TimeSlot>(),
            Err(TimeSlotError::Time(_))
        ));
    }

    #[test]
    fn overlap_is_half_open() {
        let a = slot("Tuesday, 20/10/2026 10:00-11:00");
        let b = slot("Tuesday, 20/10/2026 11:00-12:00");
        let c = slot("Tuesday, 20/10/2026 10:30-11:30");
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn converts_local_time_with_offset() {
        let s = slot("Tuesday, 20/10/2026 10:00-11:00");
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        assert_eq!(s.starts_at(ist).to_rfc3339(), "2026-10-20T04:30:00+00:00");
        assert_eq!(s.ends_at(ist).to_rfc3339(), "2026-10-20T05:30:00+00:00");
    }

    #[test]
    fn json_accepts_text_and_fields() {
        let from_text: TimeSlot =
            serde_json::from_value(serde_json::json!("Tuesday, 20/10/2026 10:00-11:00")).unwrap();
        let from_fields: TimeSlot = serde_json::from_value(serde_json::json!({
            "date": "2026-10-20",
            "start_time": "10:00",
            "end_time": "11:00"
        }))
        .unwrap();
        assert_eq!(from_text, from_fields);

        let out = serde_json::to_value(from_text).unwrap();
        assert_eq!(out["label"], "Tuesday, 20/10/2026 10:00-11:00");
        assert_eq!(out["start_time"], "10:00");
        let back: TimeSlot = serde_json::from_value(out).unwrap();
        assert_eq!(back, from_text);
    }
}
