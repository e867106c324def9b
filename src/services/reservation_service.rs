use chrono::{DateTime, Duration, FixedOffset, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::time_block::{TimeBlock, REASON_INTERVIEW, REASON_MANUAL, REASON_TEMPORARY};
use crate::models::time_slot::TimeSlot;

/// A calendar row about to be written under the interviewer lock.
#[derive(Debug, Clone)]
pub struct NewBlock {
    pub interviewer_id: Uuid,
    pub slot: TimeSlot,
    pub reason: &'static str,
    pub expires_at: Option<DateTime<Utc>>,
    pub interview_id: Option<Uuid>,
    pub reserved_by: Option<Uuid>,
}

impl NewBlock {
    pub fn temporary(interviewer_id: Uuid, slot: TimeSlot, user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            interviewer_id,
            slot,
            reason: REASON_TEMPORARY,
            expires_at: Some(expires_at),
            interview_id: None,
            reserved_by: Some(user_id),
        }
    }

    pub fn manual(interviewer_id: Uuid, slot: TimeSlot, user_id: Uuid) -> Self {
        Self {
            interviewer_id,
            slot,
            reason: REASON_MANUAL,
            expires_at: None,
            interview_id: None,
            reserved_by: Some(user_id),
        }
    }

    pub fn interview(interviewer_id: Uuid, slot: TimeSlot, interview_id: Uuid) -> Self {
        Self {
            interviewer_id,
            slot,
            reason: REASON_INTERVIEW,
            expires_at: None,
            interview_id: Some(interview_id),
            reserved_by: None,
        }
    }
}

pub fn hold_expiry(now: DateTime<Utc>, hold_minutes: i64) -> DateTime<Utc> {
    now + Duration::minutes(hold_minutes.max(1))
}

pub fn ensure_future(slot: &TimeSlot, now: DateTime<Utc>, offset: FixedOffset) -> Result<()> {
    if slot.starts_at(offset) <= now {
        return Err(Error::BadRequest("Time slot is in the past".to_string()));
    }
    Ok(())
}

/// Locks the interviewer row for the rest of the transaction and reports eligibility.
pub async fn lock_interviewer(conn: &mut PgConnection, interviewer_id: Uuid) -> Result<bool> {
    let eligible: Option<bool> =
        sqlx::query_scalar(r#"SELECT is_eligible FROM interviewers WHERE id = $1 FOR UPDATE"#)
            .bind(interviewer_id)
            .fetch_optional(&mut *conn)
            .await?;
    eligible.ok_or_else(|| Error::NotFound("Interviewer not found".to_string()))
}

pub async fn purge_expired_for(conn: &mut PgConnection, interviewer_id: Uuid) -> Result<u64> {
    let done = sqlx::query(
        r#"DELETE FROM interviewer_time_blocks
           WHERE interviewer_id = $1 AND is_temporary = TRUE AND expires_at <= NOW()"#,
    )
    .bind(interviewer_id)
    .execute(&mut *conn)
    .await?;
    Ok(done.rows_affected())
}

/// First live block overlapping `slot`, skipping rows tied to `ignore_interview`.
pub async fn find_conflict(
    conn: &mut PgConnection,
    interviewer_id: Uuid,
    slot: &TimeSlot,
    ignore_interview: Option<Uuid>,
) -> Result<Option<TimeBlock>> {
    let row = sqlx::query_as::<_, TimeBlock>(
        r#"
        SELECT * FROM interviewer_time_blocks
        WHERE interviewer_id = $1
          AND blocked_date = $2
          AND start_time < $4
          AND end_time > $3
          AND (is_temporary = FALSE OR expires_at > NOW())
          AND ($5::uuid IS NULL OR interview_id IS DISTINCT FROM $5)
        ORDER BY start_time
        LIMIT 1
        "#,
    )
    .bind(interviewer_id)
    .bind(slot.date)
    .bind(slot.start)
    .bind(slot.end)
    .bind(ignore_interview)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub async fn insert_block(conn: &mut PgConnection, block: &NewBlock) -> Result<TimeBlock> {
    let row = sqlx::query_as::<_, TimeBlock>(
        r#"
        INSERT INTO interviewer_time_blocks (
            interviewer_id, blocked_date, start_time, end_time,
            is_temporary, expires_at, block_reason, interview_id, reserved_by
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(block.interviewer_id)
    .bind(block.slot.date)
    .bind(block.slot.start)
    .bind(block.slot.end)
    .bind(block.expires_at.is_some())
    .bind(block.expires_at)
    .bind(block.reason)
    .bind(block.interview_id)
    .bind(block.reserved_by)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

/// Inserts `block` if its slot is free; the caller must already hold the interviewer lock.
pub async fn insert_if_free(
    conn: &mut PgConnection,
    block: &NewBlock,
    ignore_interview: Option<Uuid>,
) -> Result<TimeBlock> {
    purge_expired_for(&mut *conn, block.interviewer_id).await?;
    if let Some(existing) = find_conflict(&mut *conn, block.interviewer_id, &block.slot, ignore_interview).await? {
        tracing::info!(
            interviewer_id = %block.interviewer_id,
            conflicting_block = %existing.id,
            slot = %block.slot,
            "slot already taken"
        );
        return Err(Error::Conflict("Time slot is no longer available".to_string()));
    }
    insert_block(&mut *conn, block).await
}

/// Turns a live hold into the interview's permanent block; an expired, released or
/// already promoted hold is a conflict.
pub async fn promote_to_permanent(conn: &mut PgConnection, reservation_id: Uuid, interview_id: Uuid) -> Result<TimeBlock> {
    let row = sqlx::query_as::<_, TimeBlock>(
        r#"
        UPDATE interviewer_time_blocks
        SET is_temporary = FALSE, expires_at = NULL, block_reason = 'interview_scheduled', interview_id = $2
        WHERE id = $1 AND is_temporary = TRUE AND expires_at > NOW()
        RETURNING *
        "#,
    )
    .bind(reservation_id)
    .bind(interview_id)
    .fetch_optional(&mut *conn)
    .await?;
    row.ok_or_else(|| Error::Conflict("Reservation expired or already claimed".to_string()))
}

/// Same as [`promote_to_permanent`], locating the hold by interviewer and slot start.
pub async fn promote_by_slot(
    conn: &mut PgConnection,
    interviewer_id: Uuid,
    slot: &TimeSlot,
    interview_id: Uuid,
) -> Result<TimeBlock> {
    let row = sqlx::query_as::<_, TimeBlock>(
        r#"
        UPDATE interviewer_time_blocks
        SET is_temporary = FALSE, expires_at = NULL, block_reason = 'interview_scheduled', interview_id = $4
        WHERE id = (
            SELECT id FROM interviewer_time_blocks
            WHERE interviewer_id = $1 AND blocked_date = $2 AND start_time = $3
              AND is_temporary = TRUE AND expires_at > NOW() AND block_reason = 'temporary_reservation'
            ORDER BY created_at
            LIMIT 1
        )
        RETURNING *
        "#,
    )
    .bind(interviewer_id)
    .bind(slot.date)
    .bind(slot.start)
    .bind(interview_id)
    .fetch_optional(&mut *conn)
    .await?;
    row.ok_or_else(|| Error::Conflict("Reservation expired or already claimed".to_string()))
}

pub async fn delete_interview_blocks(conn: &mut PgConnection, interview_id: Uuid) -> Result<u64> {
    let done = sqlx::query(r#"DELETE FROM interviewer_time_blocks WHERE interview_id = $1"#)
        .bind(interview_id)
        .execute(&mut *conn)
        .await?;
    Ok(done.rows_affected())
}

#[derive(Clone)]
pub struct ReservationService {
    pool: PgPool,
}

impl ReservationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_temporary(
        &self,
        interviewer_id: Uuid,
        slot: TimeSlot,
        user_id: Uuid,
        hold_minutes: i64,
    ) -> Result<TimeBlock> {
        let offset = crate::config::get_config().schedule_offset();
        let now = Utc::now();
        ensure_future(&slot, now, offset)?;

        let mut tx = self.pool.begin().await?;
        if !lock_interviewer(&mut tx, interviewer_id).await? {
            return Err(Error::NotFound("Interviewer not found".to_string()));
        }
        let block = insert_if_free(
            &mut tx,
            &NewBlock::temporary(interviewer_id, slot, user_id, hold_expiry(now, hold_minutes)),
            None,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            reservation_id = %block.id,
            interviewer_id = %interviewer_id,
            user_id = %user_id,
            slot = %slot,
            expires_at = ?block.expires_at,
            "temporary reservation created"
        );
        Ok(block)
    }

    pub async fn create_manual_block(&self, interviewer_id: Uuid, slot: TimeSlot, user_id: Uuid) -> Result<TimeBlock> {
        let offset = crate::config::get_config().schedule_offset();
        ensure_future(&slot, Utc::now(), offset)?;

        let mut tx = self.pool.begin().await?;
        lock_interviewer(&mut tx, interviewer_id).await?;
        let block = insert_if_free(&mut tx, &NewBlock::manual(interviewer_id, slot, user_id), None).await?;
        tx.commit().await?;
        tracing::info!(block_id = %block.id, interviewer_id = %interviewer_id, slot = %slot, "manual block created");
        Ok(block)
    }

    pub async fn delete_manual_block(&self, interviewer_id: Uuid, block_id: Uuid) -> Result<()> {
        let done = sqlx::query(
            r#"DELETE FROM interviewer_time_blocks
               WHERE id = $1 AND interviewer_id = $2 AND block_reason = 'manual'"#,
        )
        .bind(block_id)
        .bind(interviewer_id)
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound("Block not found".to_string()));
        }
        Ok(())
    }

    pub async fn list_blocks(&self, interviewer_id: Uuid) -> Result<Vec<TimeBlock>> {
        let rows = sqlx::query_as::<_, TimeBlock>(
            r#"
            SELECT * FROM interviewer_time_blocks
            WHERE interviewer_id = $1
              AND blocked_date >= CURRENT_DATE - 1
              AND (is_temporary = FALSE OR expires_at > NOW())
            ORDER BY blocked_date, start_time
            "#,
        )
        .bind(interviewer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// The caller's unexpired hold, as checked before checkout.
    pub async fn get_active_hold(&self, reservation_id: Uuid, user_id: Uuid) -> Result<TimeBlock> {
        let block = sqlx::query_as::<_, TimeBlock>(
            r#"SELECT * FROM interviewer_time_blocks WHERE id = $1 AND reserved_by = $2"#,
        )
        .bind(reservation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Reservation not found".to_string()))?;

        if !block.is_temporary || !block.is_active(Utc::now()) {
            return Err(Error::Conflict("Reservation expired or already claimed".to_string()));
        }
        Ok(block)
    }

    pub async fn release(&self, reservation_id: Uuid, user_id: Uuid) -> Result<()> {
        let done = sqlx::query(
            r#"DELETE FROM interviewer_time_blocks
               WHERE id = $1 AND reserved_by = $2 AND is_temporary = TRUE"#,
        )
        .bind(reservation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound("Reservation not found".to_string()));
        }
        tracing::info!(reservation_id = %reservation_id, user_id = %user_id, "reservation released");
        Ok(())
    }

    /// Drops a hold after a failed payment; returns whether anything was removed.
    pub async fn release_hold(&self, reservation_id: Uuid) -> Result<bool> {
        let done = sqlx::query(r#"DELETE FROM interviewer_time_blocks WHERE id = $1 AND is_temporary = TRUE"#)
            .bind(reservation_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn cleanup_expired(&self) -> Result<u64> {
        let done = sqlx::query(
            r#"DELETE FROM interviewer_time_blocks WHERE is_temporary = TRUE AND expires_at <= NOW()"#,
        )
        .execute(&self.pool)
        .await?;
        let removed = done.rows_affected();
        if removed > 0 {
            tracing::info!(removed, "expired reservations cleaned up");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    #[test]
    fn hold_lasts_the_configured_minutes() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 4, 0, 0).unwrap();
        assert_eq!(hold_expiry(now, 10), now + Duration::minutes(10));
        assert_eq!(hold_expiry(now, 0), now + Duration::minutes(1));
    }

    #[test]
    fn past_slots_are_rejected_in_local_time() {
        let slot: TimeSlot = "Tuesday, 20/10/2026 10:00-11:00".parse().unwrap();
        // 04:29 UTC is 09:59 IST.
        let before = Utc.with_ymd_and_hms(2026, 10, 20, 4, 29, 0).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 10, 20, 4, 30, 0).unwrap();
        assert!(ensure_future(&slot, before, ist()).is_ok());
        assert!(matches!(ensure_future(&slot, at, ist()), Err(Error::BadRequest(_))));
    }

    #[test]
    fn block_kinds_carry_the_right_reason() {
        let slot: TimeSlot = "Tuesday, 20/10/2026 10:00-11:00".parse().unwrap();
        let interviewer = Uuid::new_v4();
        let user = Uuid::new_v4();
        let expiry = Utc.with_ymd_and_hms(2026, 10, 19, 4, 10, 0).unwrap();

        let hold = NewBlock::temporary(interviewer, slot, user, expiry);
        assert_eq!(hold.reason, REASON_TEMPORARY);
        assert_eq!(hold.expires_at, Some(expiry));
        assert_eq!(hold.reserved_by, Some(user));

        let manual = NewBlock::manual(interviewer, slot, user);
        assert_eq!(manual.reason, REASON_MANUAL);
        assert!(manual.expires_at.is_none());

        let booked = NewBlock::interview(interviewer, slot, Uuid::nil());
        assert_eq!(booked.reason, REASON_INTERVIEW);
        assert_eq!(booked.interview_id, Some(Uuid::nil()));
    }
}
