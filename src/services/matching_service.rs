use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::interviewer::{Interviewer, InterviewerSummary};
use crate::models::time_block::TimeBlock;
use crate::models::time_slot::TimeSlot;
use crate::services::interviewer_service::SELECT_INTERVIEWER;

pub const MIN_MATCH_SCORE: u32 = 20;
pub const MAX_ALTERNATIVES: usize = 3;
const LOOKAHEAD_DAYS: i64 = 7;
const CANDIDATE_START_HOURS: [u32; 7] = [9, 10, 11, 12, 14, 15, 16];

#[derive(Debug, Clone)]
pub struct CandidateProfile {
    pub experience_years: i32,
    pub skill_categories: Vec<String>,
    pub specific_skills: Vec<String>,
    pub requested_slot: TimeSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub experience: u32,
    pub skills: u32,
    pub time: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.experience + self.skills + self.time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub interviewer: InterviewerSummary,
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub requested_slot: TimeSlot,
    pub exact_slot_available: bool,
    pub alternative_slots: Vec<TimeSlot>,
}

pub fn experience_score(interviewer_years: i32, candidate_years: i32) -> u32 {
    match (interviewer_years - candidate_years).abs() {
        0..=1 => 30,
        2 => 20,
        3 => 10,
        _ => 0,
    }
}

fn fuzzy_eq(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a))
}

pub fn skill_score(candidate_skills: &[&str], interviewer: &Interviewer) -> u32 {
    let wanted: Vec<&str> = candidate_skills
        .iter()
        .copied()
        .filter(|s| !s.trim().is_empty())
        .collect();
    if wanted.is_empty() {
        return 0;
    }
    let matched = wanted
        .iter()
        .filter(|skill| interviewer.expertise().any(|have| fuzzy_eq(skill, have)))
        .count();
    ((matched as f64 / wanted.len() as f64) * 40.0).round() as u32
}

/// Whether `slot` fits the interviewer's week and calendar right now.
pub fn slot_is_free(
    interviewer: &Interviewer,
    slot: &TimeSlot,
    blocks: &[TimeBlock],
    now: DateTime<Utc>,
) -> bool {
    let day = slot.weekday();
    interviewer.is_available_on(day)
        && interviewer
            .work_windows(day)
            .iter()
            .any(|(from, to)| slot.within(*from, *to))
        && !blocks
            .iter()
            .filter(|b| b.interviewer_id == interviewer.id)
            .any(|b| b.blocks(slot, now))
}

/// Up to three free hour-long slots in the week after `today`.
pub fn alternative_slots(
    interviewer: &Interviewer,
    blocks: &[TimeBlock],
    today: NaiveDate,
    now: DateTime<Utc>,
    offset: chrono::FixedOffset,
) -> Vec<TimeSlot> {
    let mut found = Vec::new();
    for day_offset in 1..=LOOKAHEAD_DAYS {
        let date = today + Duration::days(day_offset);
        for hour in CANDIDATE_START_HOURS {
            let Some(start) = NaiveTime::from_hms_opt(hour, 0, 0) else {
                continue;
            };
            let Ok(slot) = TimeSlot::starting_at(date, start, 60) else {
                continue;
            };
            if slot.starts_at(offset) <= now {
                continue;
            }
            if slot_is_free(interviewer, &slot, blocks, now) {
                found.push(slot);
                if found.len() == MAX_ALTERNATIVES {
                    return found;
                }
            }
        }
    }
    found
}

pub struct MatchContext<'a> {
    pub blocks: &'a [TimeBlock],
    pub now: DateTime<Utc>,
    pub offset: chrono::FixedOffset,
}

impl MatchContext<'_> {
    fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.offset).date_naive()
    }
}

pub fn score_interviewer(
    candidate: &CandidateProfile,
    interviewer: &Interviewer,
    ctx: &MatchContext<'_>,
) -> MatchResult {
    let skills: Vec<&str> = candidate
        .skill_categories
        .iter()
        .chain(candidate.specific_skills.iter())
        .map(String::as_str)
        .collect();

    let requested = candidate.requested_slot;
    let exact = requested.starts_at(ctx.offset) > ctx.now
        && slot_is_free(interviewer, &requested, ctx.blocks, ctx.now);
    let alternatives = if exact {
        Vec::new()
    } else {
        alternative_slots(interviewer, ctx.blocks, ctx.today(), ctx.now, ctx.offset)
    };
    let time = if exact {
        30
    } else if !alternatives.is_empty() {
        15
    } else {
        0
    };

    let breakdown = ScoreBreakdown {
        experience: experience_score(interviewer.experience_years, candidate.experience_years),
        skills: skill_score(&skills, interviewer),
        time,
    };

    MatchResult {
        interviewer: InterviewerSummary::from(interviewer),
        score: breakdown.total(),
        breakdown,
        requested_slot: requested,
        exact_slot_available: exact,
        alternative_slots: alternatives,
    }
}

/// Highest-scoring eligible interviewer; ties keep the earlier interviewer.
pub fn find_best_match(
    candidate: &CandidateProfile,
    interviewers: &[Interviewer],
    ctx: &MatchContext<'_>,
) -> Result<MatchResult> {
    let eligible: Vec<&Interviewer> = interviewers.iter().filter(|i| i.is_eligible).collect();
    if eligible.is_empty() {
        return Err(Error::NotFound("No eligible interviewers found".into()));
    }

    let mut best: Option<MatchResult> = None;
    for interviewer in eligible {
        let result = score_interviewer(candidate, interviewer, ctx);
        tracing::debug!(
            interviewer_id = %interviewer.id,
            score = result.score,
            experience = result.breakdown.experience,
            skills = result.breakdown.skills,
            time = result.breakdown.time,
            "scored interviewer"
        );
        if best.as_ref().map(|b| result.score > b.score).unwrap_or(true) {
            best = Some(result);
        }
    }

    match best {
        Some(result) if result.score >= MIN_MATCH_SCORE => Ok(result),
        _ => Err(Error::NotFound("No suitable interviewer found".into())),
    }
}

#[derive(Clone)]
pub struct MatchingService {
    pool: PgPool,
}

impl MatchingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn eligible_interviewers(&self) -> Result<Vec<Interviewer>> {
        let rows = sqlx::query_as::<_, Interviewer>(&format!(
            "{} WHERE i.is_eligible = TRUE ORDER BY i.created_at ASC, i.id ASC",
            SELECT_INTERVIEWER
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn blocks_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<TimeBlock>> {
        let rows = sqlx::query_as::<_, TimeBlock>(
            r#"
            SELECT b.* FROM interviewer_time_blocks b
            JOIN interviewers i ON i.id = b.interviewer_id
            WHERE i.is_eligible = TRUE
              AND b.blocked_date BETWEEN $1 AND $2
              AND (b.is_temporary = FALSE OR b.expires_at > NOW())
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_match(&self, candidate: &CandidateProfile) -> Result<MatchResult> {
        let config = crate::config::get_config();
        let offset = config.schedule_offset();
        let now = Utc::now();
        let today = now.with_timezone(&offset).date_naive();

        let interviewers = self.eligible_interviewers().await?;
        let requested = candidate.requested_slot.date;
        let horizon = today + Duration::days(LOOKAHEAD_DAYS);
        let blocks = self
            .blocks_between(requested.min(today), requested.max(horizon))
            .await?;

        let ctx = MatchContext {
            blocks: &blocks,
            now,
            offset,
        };
        let result = find_best_match(candidate, &interviewers, &ctx)?;
        tracing::info!(
            interviewer_id = %result.interviewer.id,
            score = result.score,
            exact = result.exact_slot_available,
            alternatives = result.alternative_slots.len(),
            "interviewer matched"
        );
        Ok(result)
    }
}
