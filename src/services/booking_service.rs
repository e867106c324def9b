use chrono::{FixedOffset, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::add_on::SelectedAddOn;
use crate::models::interview::{Interview, InterviewStatus, InterviewWithParties};
use crate::models::payment_session::{PaymentSession, PaymentStatus};
use crate::models::time_slot::TimeSlot;
use crate::services::audit_service::AuditService;
use crate::services::email_templates::{EmailPayload, EmailTemplate};
use crate::services::interviewer_service::InterviewerService;
use crate::services::notification_service::NotificationService;
use crate::services::profile_service::ProfileService;
use crate::services::reservation_service::{self as calendar, NewBlock};
use crate::utils::token::meeting_link;

pub(crate) const SELECT_WITH_PARTIES: &str = r#"
    SELECT i.*, p.full_name AS interviewer_name, p.email AS interviewer_email,
           iv.user_id AS interviewer_user_id
    FROM interviews i
    JOIN interviewers iv ON iv.id = i.interviewer_id
    JOIN profiles p ON p.id = iv.user_id
"#;

/// Who is acting on an interview.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Actor {
    pub fn may_access(&self, interview: &InterviewWithParties) -> bool {
        self.is_admin
            || interview.interview.candidate_id == self.user_id
            || interview.interviewer_user_id == self.user_id
    }
}

/// Candidate-facing and interviewer-facing payloads for one interview.
pub fn participant_payloads(
    interview: &InterviewWithParties,
    offset: FixedOffset,
) -> (EmailPayload, EmailPayload) {
    let i = &interview.interview;
    let add_ons: Vec<String> = serde_json::from_value::<Vec<SelectedAddOn>>(i.selected_add_ons.clone())
        .unwrap_or_default()
        .into_iter()
        .map(|a| if a.quantity > 1 { format!("{} x{}", a.name, a.quantity) } else { a.name })
        .collect();
    let base = EmailPayload {
        target_role: Some(i.target_role.clone()),
        slot_label: i.local_slot(offset).map(|s| s.label()),
        meeting_link: i.meeting_link.clone(),
        plan_type: Some(i.plan_type.clone()),
        add_ons,
        ..Default::default()
    };
    let candidate = EmailPayload {
        recipient_name: i.candidate_name.clone(),
        counterpart_name: Some(interview.interviewer_name.clone()),
        ..base.clone()
    };
    let interviewer = EmailPayload {
        recipient_name: interview.interviewer_name.clone(),
        counterpart_name: Some(i.candidate_name.clone()),
        ..base
    };
    (candidate, interviewer)
}

pub fn ensure_reschedulable(interview: &Interview, max_reschedules: i32) -> Result<()> {
    match interview.status() {
        Some(s) if s.is_upcoming() => {}
        _ => {
            return Err(Error::Conflict(format!(
                "Interview is {} and can no longer be rescheduled",
                interview.status
            )))
        }
    }
    if interview.reschedule_count >= max_reschedules {
        return Err(Error::BadRequest(format!(
            "Interview can be rescheduled at most {} times",
            max_reschedules
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct BookingService {
    pool: PgPool,
    interviewers: InterviewerService,
    profiles: ProfileService,
    notifications: NotificationService,
    audit: AuditService,
}

impl BookingService {
    pub fn new(
        pool: PgPool,
        interviewers: InterviewerService,
        profiles: ProfileService,
        notifications: NotificationService,
        audit: AuditService,
    ) -> Self {
        Self {
            pool,
            interviewers,
            profiles,
            notifications,
            audit,
        }
    }

    async fn load_session(&self, session_id: Uuid) -> Result<PaymentSession> {
        sqlx::query_as::<_, PaymentSession>(r#"SELECT * FROM payment_sessions WHERE id = $1"#)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Payment session not found".to_string()))
    }

    async fn interview_for_session(&self, session_id: Uuid) -> Result<Option<Interview>> {
        let row = sqlx::query_as::<_, Interview>(r#"SELECT * FROM interviews WHERE payment_session_id = $1"#)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Books the paid session's interview; repeated calls return the same interview.
    pub async fn auto_book(&self, session_id: Uuid) -> Result<Interview> {
        let session = self.load_session(session_id).await?;
        if session.status().ok() != Some(PaymentStatus::Completed) {
            return Err(Error::Conflict(format!(
                "Payment session is {}, not completed",
                session.payment_status
            )));
        }
        if session.interview_matched {
            if let Some(existing) = self.interview_for_session(session_id).await? {
                tracing::info!(session_id = %session_id, interview_id = %existing.id, "session already booked");
                return Ok(existing);
            }
        }

        let interviewer = self.interviewers.get(session.interviewer_id).await?;
        let snapshot = session.candidate_data.0.clone();
        let candidate_profile = self.profiles.find(session.user_id).await?;
        let (candidate_name, candidate_email) = match candidate_profile {
            Some(p) => (p.full_name, p.email),
            None => (snapshot.full_name.clone(), snapshot.email.clone()),
        };

        let config = crate::config::get_config();
        let offset = config.schedule_offset();
        let slot = session.time_slot();
        let scheduled_time = slot.starts_at(offset);

        let mut tx = self.pool.begin().await?;
        let claimed: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE payment_sessions SET interview_matched = TRUE, updated_at = NOW()
            WHERE id = $1 AND interview_matched = FALSE AND payment_status = 'completed'
            RETURNING id
            "#,
        )
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?;

        if claimed.is_none() {
            tx.rollback().await?;
            return self
                .interview_for_session(session_id)
                .await?
                .ok_or_else(|| Error::Conflict("Booking for this session is already in progress".to_string()));
        }

        calendar::lock_interviewer(&mut tx, interviewer.id).await?;

        let interview_id = Uuid::new_v4();
        let interview = sqlx::query_as::<_, Interview>(
            r#"
            INSERT INTO interviews (
                id, interviewer_id, payment_session_id, candidate_id, candidate_name, candidate_email,
                target_role, scheduled_time, duration_minutes, status, plan_type, selected_add_ons,
                meeting_link, resume_url
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'scheduled', $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(interview_id)
        .bind(interviewer.id)
        .bind(session.id)
        .bind(session.user_id)
        .bind(&candidate_name)
        .bind(&candidate_email)
        .bind(&snapshot.target_role)
        .bind(scheduled_time)
        .bind(slot.duration_minutes() as i32)
        .bind(&session.plan_type)
        .bind(&session.selected_add_ons)
        .bind(meeting_link(&config.meeting_base_url, interview_id))
        .bind(&snapshot.resume_url)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(r#"UPDATE payment_sessions SET interview_id = $2, updated_at = NOW() WHERE id = $1"#)
            .bind(session.id)
            .bind(interview.id)
            .execute(&mut *tx)
            .await?;

        let promoted = match session.reservation_id {
            Some(reservation_id) => calendar::promote_to_permanent(&mut tx, reservation_id, interview.id).await,
            None => calendar::promote_by_slot(&mut tx, interviewer.id, &slot, interview.id).await,
        };
        match promoted {
            Ok(block) => {
                tracing::info!(block_id = %block.id, interview_id = %interview.id, "reservation promoted");
            }
            Err(Error::Conflict(_)) => {
                tracing::warn!(
                    session_id = %session.id,
                    reservation_id = ?session.reservation_id,
                    "reservation could not be promoted, blocking slot directly"
                );
                match calendar::insert_if_free(&mut tx, &NewBlock::interview(interviewer.id, slot, interview.id), None).await {
                    Ok(_) => {}
                    Err(Error::Conflict(_)) => {
                        tracing::error!(
                            interview_id = %interview.id,
                            interviewer_id = %interviewer.id,
                            slot = %slot,
                            "slot taken by another block, interview booked without calendar block"
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }

        tx.commit().await?;

        tracing::info!(
            session_id = %session.id,
            interview_id = %interview.id,
            interviewer_id = %interviewer.id,
            scheduled_time = %interview.scheduled_time,
            "interview booked"
        );
        self.audit
            .record(
                Some(session.user_id),
                "interview.booked",
                "interview",
                interview.id,
                json!({ "payment_session_id": session.id, "interviewer_id": interviewer.id, "slot": slot.label() }),
            )
            .await;

        let parties = InterviewWithParties {
            interview: interview.clone(),
            interviewer_name: interviewer.full_name.clone(),
            interviewer_email: interviewer.email.clone(),
            interviewer_user_id: interviewer.user_id,
        };
        let (to_candidate, to_interviewer) = participant_payloads(&parties, offset);
        self.notifications
            .notify(EmailTemplate::BookingConfirmation, &candidate_email, &to_candidate)
            .await;
        self.notifications
            .notify(EmailTemplate::InterviewerBooking, &interviewer.email, &to_interviewer)
            .await;

        Ok(interview)
    }

    pub async fn get_with_parties(&self, id: Uuid) -> Result<InterviewWithParties> {
        sqlx::query_as::<_, InterviewWithParties>(&format!("{} WHERE i.id = $1", SELECT_WITH_PARTIES))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Interview not found".to_string()))
    }

    pub async fn get_for(&self, id: Uuid, actor: Actor) -> Result<InterviewWithParties> {
        let interview = self.get_with_parties(id).await?;
        if !actor.may_access(&interview) {
            return Err(Error::Forbidden("Not a participant of this interview".to_string()));
        }
        Ok(interview)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<InterviewWithParties>> {
        let rows = sqlx::query_as::<_, InterviewWithParties>(&format!(
            "{} WHERE i.candidate_id = $1 OR iv.user_id = $1 ORDER BY i.scheduled_time DESC",
            SELECT_WITH_PARTIES
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn reschedule(&self, id: Uuid, actor: Actor, new_slot: TimeSlot) -> Result<Interview> {
        let current = self.get_for(id, actor).await?;
        let config = crate::config::get_config();
        let offset = config.schedule_offset();
        ensure_reschedulable(&current.interview, config.max_reschedules)?;
        calendar::ensure_future(&new_slot, Utc::now(), offset)?;
        let previous = current.interview.local_slot(offset);

        let mut tx = self.pool.begin().await?;
        calendar::lock_interviewer(&mut tx, current.interview.interviewer_id).await?;
        calendar::purge_expired_for(&mut tx, current.interview.interviewer_id).await?;
        if calendar::find_conflict(&mut tx, current.interview.interviewer_id, &new_slot, Some(id))
            .await?
            .is_some()
        {
            return Err(Error::Conflict("Time slot is no longer available".to_string()));
        }
        calendar::delete_interview_blocks(&mut tx, id).await?;
        calendar::insert_block(&mut tx, &NewBlock::interview(current.interview.interviewer_id, new_slot, id)).await?;

        let updated = sqlx::query_as::<_, Interview>(
            r#"
            UPDATE interviews
            SET scheduled_time = $2, duration_minutes = $3, status = 'rescheduled',
                reschedule_count = reschedule_count + 1, reminder_sent_at = NULL, updated_at = NOW()
            WHERE id = $1 AND status IN ('scheduled', 'rescheduled') AND reschedule_count < $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_slot.starts_at(offset))
        .bind(new_slot.duration_minutes() as i32)
        .bind(config.max_reschedules)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::Conflict("Interview changed while rescheduling, try again".to_string()))?;
        tx.commit().await?;

        tracing::info!(interview_id = %id, from = ?previous.map(|s| s.label()), to = %new_slot, "interview rescheduled");
        self.audit
            .record(
                Some(actor.user_id),
                "interview.rescheduled",
                "interview",
                id,
                json!({ "from": previous.map(|s| s.label()), "to": new_slot.label(), "count": updated.reschedule_count }),
            )
            .await;

        let parties = InterviewWithParties {
            interview: updated.clone(),
            ..current
        };
        let (mut to_candidate, mut to_interviewer) = participant_payloads(&parties, offset);
        to_candidate.previous_slot_label = previous.map(|s| s.label());
        to_interviewer.previous_slot_label = previous.map(|s| s.label());
        self.notifications
            .notify(EmailTemplate::RescheduleNotice, &updated.candidate_email, &to_candidate)
            .await;
        self.notifications
            .notify(EmailTemplate::RescheduleNotice, &parties.interviewer_email, &to_interviewer)
            .await;

        Ok(updated)
    }

    pub async fn cancel(&self, id: Uuid, actor: Actor, reason: Option<String>) -> Result<Interview> {
        let current = self.get_for(id, actor).await?;
        if !current.interview.status().map(|s| s.is_upcoming()).unwrap_or(false) {
            return Err(Error::Conflict(format!(
                "Interview is {} and cannot be cancelled",
                current.interview.status
            )));
        }

        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Interview>(
            r#"
            UPDATE interviews
            SET status = 'cancelled', cancellation_reason = $2, updated_at = NOW()
            WHERE id = $1 AND status IN ('scheduled', 'rescheduled')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&reason)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::Conflict("Interview is no longer upcoming".to_string()))?;
        let freed = calendar::delete_interview_blocks(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(interview_id = %id, freed_blocks = freed, "interview cancelled");
        self.audit
            .record(
                Some(actor.user_id),
                "interview.cancelled",
                "interview",
                id,
                json!({ "reason": reason, "status": InterviewStatus::Cancelled.as_str() }),
            )
            .await;

        let offset = crate::config::get_config().schedule_offset();
        let parties = InterviewWithParties {
            interview: updated.clone(),
            ..current
        };
        let (mut to_candidate, mut to_interviewer) = participant_payloads(&parties, offset);
        to_candidate.reason = reason.clone();
        to_interviewer.reason = reason;
        self.notifications
            .notify(EmailTemplate::CancellationNotice, &updated.candidate_email, &to_candidate)
            .await;
        self.notifications
            .notify(EmailTemplate::CancellationNotice, &parties.interviewer_email, &to_interviewer)
            .await;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parties(status: &str, reschedules: i32) -> InterviewWithParties {
        InterviewWithParties {
            interview: Interview {
                id: Uuid::new_v4(),
                interviewer_id: Uuid::new_v4(),
                payment_session_id: Some(Uuid::new_v4()),
                candidate_id: Uuid::from_u128(1),
                candidate_name: "Priya".into(),
                candidate_email: "priya@example.com".into(),
                target_role: "Backend Engineer".into(),
                scheduled_time: Utc.with_ymd_and_hms(2026, 10, 20, 4, 30, 0).unwrap(),
                duration_minutes: 60,
                status: status.into(),
                plan_type: "pro".into(),
                selected_add_ons: json!([
                    {"code": "resume", "name": "Resume deep-dive", "unit_price": "299", "quantity": 1, "line_total": "299"},
                    {"code": "extra", "name": "Extra round", "unit_price": "500", "quantity": 2, "line_total": "1000"}
                ]),
                meeting_link: Some("https://meet.jit.si/mockhire-x".into()),
                resume_url: None,
                reschedule_count: reschedules,
                cancellation_reason: None,
                reminder_sent_at: None,
                feedback_requested_at: None,
                created_at: None,
                updated_at: None,
            },
            interviewer_name: "Ada".into(),
            interviewer_email: "ada@example.com".into(),
            interviewer_user_id: Uuid::from_u128(2),
        }
    }

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    #[test]
    fn payloads_address_each_party() {
        let (candidate, interviewer) = participant_payloads(&parties("scheduled", 0), ist());
        assert_eq!(candidate.recipient_name, "Priya");
        assert_eq!(candidate.counterpart_name.as_deref(), Some("Ada"));
        assert_eq!(interviewer.recipient_name, "Ada");
        assert_eq!(interviewer.counterpart_name.as_deref(), Some("Priya"));
        assert_eq!(candidate.slot_label.as_deref(), Some("Tuesday, 20/10/2026 10:00-11:00"));
        assert_eq!(candidate.add_ons, vec!["Resume deep-dive", "Extra round x2"]);
    }

    #[test]
    fn only_participants_and_admins_get_access() {
        let p = parties("scheduled", 0);
        let candidate = Actor { user_id: Uuid::from_u128(1), is_admin: false };
        let interviewer = Actor { user_id: Uuid::from_u128(2), is_admin: false };
        let stranger = Actor { user_id: Uuid::from_u128(3), is_admin: false };
        let admin = Actor { user_id: Uuid::from_u128(4), is_admin: true };
        assert!(candidate.may_access(&p));
        assert!(interviewer.may_access(&p));
        assert!(!stranger.may_access(&p));
        assert!(admin.may_access(&p));
    }

    #[test]
    fn reschedule_limits() {
        assert!(ensure_reschedulable(&parties("scheduled", 0).interview, 2).is_ok());
        assert!(ensure_reschedulable(&parties("rescheduled", 1).interview, 2).is_ok());
        assert!(matches!(
            ensure_reschedulable(&parties("rescheduled", 2).interview, 2),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            ensure_reschedulable(&parties("cancelled", 0).interview, 2),
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            ensure_reschedulable(&parties("completed", 0).interview, 2),
            Err(Error::Conflict(_))
        ));
    }
}
