use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::services::booking_service::{participant_payloads, BookingService};
use crate::services::email_templates::EmailTemplate;
use crate::services::notification_service::NotificationService;
use crate::services::reservation_service::ReservationService;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub expired_reservations: u64,
    pub reminders_sent: usize,
    pub interviews_completed: usize,
}

#[derive(Clone)]
pub struct MaintenanceService {
    pool: PgPool,
    reservations: ReservationService,
    booking: BookingService,
    notifications: NotificationService,
}

impl MaintenanceService {
    pub fn new(
        pool: PgPool,
        reservations: ReservationService,
        booking: BookingService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            pool,
            reservations,
            booking,
            notifications,
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport> {
        let report = SweepReport {
            expired_reservations: self.reservations.cleanup_expired().await?,
            reminders_sent: self.send_reminders().await?,
            interviews_completed: self.complete_finished().await?,
        };
        if report != SweepReport::default() {
            tracing::info!(
                expired_reservations = report.expired_reservations,
                reminders_sent = report.reminders_sent,
                interviews_completed = report.interviews_completed,
                "maintenance sweep"
            );
        }
        Ok(report)
    }

    /// Marks upcoming interviews inside the reminder window and emails both parties once.
    async fn send_reminders(&self) -> Result<usize> {
        let lead = crate::config::get_config().reminder_lead_minutes;
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE interviews SET reminder_sent_at = NOW(), updated_at = NOW()
            WHERE status IN ('scheduled', 'rescheduled')
              AND reminder_sent_at IS NULL
              AND scheduled_time > NOW()
              AND scheduled_time <= NOW() + make_interval(mins => $1::int)
            RETURNING id
            "#,
        )
        .bind(lead as i32)
        .fetch_all(&self.pool)
        .await?;

        let offset = crate::config::get_config().schedule_offset();
        for id in &ids {
            match self.booking.get_with_parties(*id).await {
                Ok(interview) => {
                    let (to_candidate, to_interviewer) = participant_payloads(&interview, offset);
                    self.notifications
                        .notify(EmailTemplate::Reminder, &interview.interview.candidate_email, &to_candidate)
                        .await;
                    self.notifications
                        .notify(EmailTemplate::Reminder, &interview.interviewer_email, &to_interviewer)
                        .await;
                }
                Err(e) => tracing::error!(interview_id = %id, error = %e, "reminder lookup failed"),
            }
        }
        Ok(ids.len())
    }

    /// Closes interviews whose end has passed and asks the candidate for feedback.
    async fn complete_finished(&self) -> Result<usize> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE interviews
            SET status = 'completed', feedback_requested_at = NOW(), updated_at = NOW()
            WHERE status IN ('scheduled', 'rescheduled')
              AND feedback_requested_at IS NULL
              AND scheduled_time + make_interval(mins => duration_minutes) <= NOW()
            RETURNING id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let offset = crate::config::get_config().schedule_offset();
        for id in &ids {
            match self.booking.get_with_parties(*id).await {
                Ok(interview) => {
                    let (to_candidate, _) = participant_payloads(&interview, offset);
                    self.notifications
                        .notify(EmailTemplate::FeedbackRequest, &interview.interview.candidate_email, &to_candidate)
                        .await;
                }
                Err(e) => tracing::error!(interview_id = %id, error = %e, "feedback lookup failed"),
            }
        }
        Ok(ids.len())
    }
}
