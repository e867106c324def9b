use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::payment_dto::{CreatePaymentSessionRequest, CreatePaymentSessionResponse};
use crate::error::{Error, Result};
use crate::models::interviewer::InterviewerSummary;
use crate::models::payment_order::{interview_order_id, KIND_INTERVIEW};
use crate::models::payment_session::{CandidateSnapshot, PaymentSession, PaymentStatus};
use crate::services::add_on_service::{AddOnService, ValidatedAddOns};
use crate::services::audit_service::AuditService;
use crate::services::booking_service::BookingService;
use crate::services::interviewer_service::InterviewerService;
use crate::services::payment_gateway::{
    normalize_phone, sanitize_customer_id, CreateOrderRequest, CustomerDetails, PaymentGateway,
};
use crate::services::pricing_service::CouponService;
use crate::services::reservation_service::ReservationService;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub base_amount: Decimal,
    pub discount_amount: Decimal,
    pub coupon_code: Option<String>,
    pub add_ons: ValidatedAddOns,
    pub amount: Decimal,
}

impl PriceBreakdown {
    pub fn new(base_amount: Decimal, discount_amount: Decimal, coupon_code: Option<String>, add_ons: ValidatedAddOns) -> Self {
        let amount = (base_amount - discount_amount).max(Decimal::ZERO) + add_ons.total;
        Self {
            base_amount,
            discount_amount,
            coupon_code,
            add_ons,
            amount,
        }
    }
}

/// What a status update did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Applied,
    Unchanged,
    Rejected { current: PaymentStatus },
}

/// Locks the hold and rejects it when a non-failed session already pays for it.
async fn ensure_hold_unclaimed(conn: &mut PgConnection, reservation_id: Uuid) -> Result<()> {
    sqlx::query(r#"SELECT id FROM interviewer_time_blocks WHERE id = $1 FOR UPDATE"#)
        .bind(reservation_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::Conflict("Reservation expired or already claimed".to_string()))?;
    let existing: Option<Uuid> = sqlx::query_scalar(
        r#"SELECT id FROM payment_sessions WHERE reservation_id = $1 AND payment_status <> 'failed' LIMIT 1"#,
    )
    .bind(reservation_id)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(session_id) = existing {
        tracing::info!(reservation_id = %reservation_id, session_id = %session_id, "reservation already has a payment session");
        return Err(Error::Conflict("A payment is already in progress for this reservation".to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PaymentService {
    pool: PgPool,
    gateway: PaymentGateway,
    coupons: CouponService,
    add_ons: AddOnService,
    reservations: ReservationService,
    interviewers: InterviewerService,
    booking: BookingService,
    audit: AuditService,
}

impl PaymentService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        gateway: PaymentGateway,
        coupons: CouponService,
        add_ons: AddOnService,
        reservations: ReservationService,
        interviewers: InterviewerService,
        booking: BookingService,
        audit: AuditService,
    ) -> Self {
        Self {
            pool,
            gateway,
            coupons,
            add_ons,
            reservations,
            interviewers,
            booking,
            audit,
        }
    }

    pub fn gateway(&self) -> &PaymentGateway {
        &self.gateway
    }

    pub async fn get(&self, id: Uuid) -> Result<PaymentSession> {
        sqlx::query_as::<_, PaymentSession>(r#"SELECT * FROM payment_sessions WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Payment session not found".to_string()))
    }

    pub async fn get_for_user(&self, id: Uuid, user_id: Uuid, is_admin: bool) -> Result<PaymentSession> {
        let session = self.get(id).await?;
        if session.user_id != user_id && !is_admin {
            return Err(Error::NotFound("Payment session not found".to_string()));
        }
        Ok(session)
    }

    async fn price(&self, req: &CreatePaymentSessionRequest) -> Result<PriceBreakdown> {
        let base = crate::config::get_config().plan_price(req.plan_type);
        let coupon = req
            .coupon_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let (discount, coupon_code) = match coupon {
            Some(code) => {
                let quote = self.coupons.quote(code, req.plan_type, base).await?;
                (quote.discount_amount, Some(quote.code))
            }
            None => (Decimal::ZERO, None),
        };
        let add_ons = self.add_ons.validate(&req.add_ons, req.plan_type).await?;
        Ok(PriceBreakdown::new(base, discount, coupon_code, add_ons))
    }

    pub async fn create_session(
        &self,
        user_id: Uuid,
        req: CreatePaymentSessionRequest,
    ) -> Result<CreatePaymentSessionResponse> {
        let hold = self.reservations.get_active_hold(req.reservation_id, user_id).await?;
        if hold.interviewer_id != req.interviewer_id || hold.slot() != req.time_slot {
            return Err(Error::BadRequest(
                "Reservation does not match the selected interviewer and time slot".to_string(),
            ));
        }
        let interviewer = self.interviewers.get(req.interviewer_id).await?;
        if !interviewer.is_eligible {
            return Err(Error::NotFound("Interviewer not found".to_string()));
        }

        let price = self.price(&req).await?;
        let config = crate::config::get_config();
        let currency = config.payment.currency.clone();
        let session_id = Uuid::new_v4();
        let order_id = interview_order_id(session_id);
        let snapshot: CandidateSnapshot = req.candidate.clone().into();
        let summary = serde_json::to_value(InterviewerSummary::from(&interviewer))?;
        let slot = req.time_slot;

        let mut tx = self.pool.begin().await?;
        ensure_hold_unclaimed(&mut tx, hold.id).await?;
        sqlx::query(
            r#"
            INSERT INTO payment_sessions (
                id, user_id, candidate_data, plan_type, base_amount, discount_amount, coupon_code,
                add_ons_total, amount, currency, payment_status, provider_order_id,
                interviewer_id, matched_interviewer, reservation_id, slot_date, slot_start, slot_end,
                selected_add_ons
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(sqlx::types::Json(&snapshot))
        .bind(req.plan_type.as_str())
        .bind(price.base_amount)
        .bind(price.discount_amount)
        .bind(&price.coupon_code)
        .bind(price.add_ons.total)
        .bind(price.amount)
        .bind(&currency)
        .bind(&order_id)
        .bind(interviewer.id)
        .bind(&summary)
        .bind(hold.id)
        .bind(slot.date)
        .bind(slot.start)
        .bind(slot.end)
        .bind(sqlx::types::Json(&price.add_ons.items))
        .execute(&mut *tx)
        .await?;
        sqlx::query(r#"INSERT INTO payment_orders (provider_order_id, kind, local_id) VALUES ($1, $2, $3)"#)
            .bind(&order_id)
            .bind(KIND_INTERVIEW)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(
            session_id = %session_id,
            user_id = %user_id,
            interviewer_id = %interviewer.id,
            plan = %req.plan_type,
            amount = %price.amount,
            "payment session created"
        );
        self.audit
            .record(
                Some(user_id),
                "payment_session.created",
                "payment_session",
                session_id,
                json!({
                    "plan_type": req.plan_type,
                    "base_amount": price.base_amount,
                    "discount_amount": price.discount_amount,
                    "coupon_code": price.coupon_code,
                    "add_ons_total": price.add_ons.total,
                    "amount": price.amount,
                }),
            )
            .await;

        let mut response = CreatePaymentSessionResponse {
            session_id,
            order_id: order_id.clone(),
            payment_session_id: None,
            amount: price.amount,
            currency: currency.clone(),
            environment: config.payment.environment.clone(),
            payment_status: PaymentStatus::Pending.as_str().to_string(),
            interview_id: None,
        };

        if price.amount.is_zero() {
            self.apply_status(session_id, PaymentStatus::Completed, None, None).await?;
            if let Some(code) = &price.coupon_code {
                self.redeem_coupon(session_id, code).await;
            }
            response.payment_status = PaymentStatus::Completed.as_str().to_string();
            match self.booking.auto_book(session_id).await {
                Ok(interview) => response.interview_id = Some(interview.id),
                Err(e) => tracing::error!(session_id = %session_id, error = %e, "auto-booking failed for free checkout"),
            }
            return Ok(response);
        }

        let customer = CustomerDetails {
            customer_id: sanitize_customer_id(&user_id.to_string()),
            customer_name: snapshot.full_name.clone(),
            customer_email: snapshot.email.clone(),
            customer_phone: normalize_phone(snapshot.phone.as_deref()),
        };
        let mut request = CreateOrderRequest::new(order_id, price.amount, &currency, customer, self.gateway.config())
            .tag("session_id", session_id)
            .tag("plan_type", req.plan_type)
            .tag("add_ons", price.add_ons.codes().join(","))
            .tag("add_ons_total", price.add_ons.total);
        if let Some(code) = &price.coupon_code {
            request = request.tag("coupon_code", code);
        }

        match self.gateway.create_order(&request).await {
            Ok(order) => {
                sqlx::query(
                    r#"UPDATE payment_sessions
                       SET payment_status = 'processing', provider_session_id = $2, updated_at = NOW()
                       WHERE id = $1 AND payment_status = 'pending'"#,
                )
                .bind(session_id)
                .bind(&order.payment_session_id)
                .execute(&self.pool)
                .await?;
                response.payment_session_id = order.payment_session_id;
                response.payment_status = PaymentStatus::Processing.as_str().to_string();
                Ok(response)
            }
            Err(e) => {
                if let Err(db) = self.apply_status(session_id, PaymentStatus::Failed, None, None).await {
                    tracing::error!(session_id = %session_id, error = %db, "could not mark session failed");
                }
                Err(e)
            }
        }
    }

    /// Guarded status change; terminal states are never overwritten.
    pub async fn apply_status(
        &self,
        session_id: Uuid,
        next: PaymentStatus,
        provider_payment_id: Option<&str>,
        actor: Option<Uuid>,
    ) -> Result<StatusChange> {
        let updated = sqlx::query_as::<_, PaymentSession>(
            r#"
            UPDATE payment_sessions
            SET payment_status = $2,
                provider_payment_id = COALESCE($3, provider_payment_id),
                updated_at = NOW()
            WHERE id = $1 AND payment_status = ANY($4)
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(next.as_str())
        .bind(provider_payment_id)
        .bind(next.predecessors())
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_some() {
            tracing::info!(session_id = %session_id, status = %next, "payment status updated");
            self.audit
                .record(
                    actor,
                    "payment_session.status_changed",
                    "payment_session",
                    session_id,
                    json!({ "status": next, "provider_payment_id": provider_payment_id }),
                )
                .await;
            return Ok(StatusChange::Applied);
        }

        let current = self.get(session_id).await?.status().map_err(Error::Internal)?;
        if current == next {
            Ok(StatusChange::Unchanged)
        } else {
            tracing::warn!(session_id = %session_id, current = %current, requested = %next, "status change rejected");
            Ok(StatusChange::Rejected { current })
        }
    }

    /// Side effects of a completed payment: coupon usage, then booking in the background.
    pub async fn after_completed(&self, session: &PaymentSession, newly_completed: bool) {
        if newly_completed {
            if let Some(code) = &session.coupon_code {
                self.redeem_coupon(session.id, code).await;
            }
        }
        let booking = self.booking.clone();
        let session_id = session.id;
        tokio::spawn(async move {
            if let Err(e) = booking.auto_book(session_id).await {
                tracing::error!(session_id = %session_id, error = %e, "auto-booking failed after payment");
            }
        });
    }

    async fn redeem_coupon(&self, session_id: Uuid, code: &str) {
        match self.coupons.redeem(code).await {
            Ok(true) => tracing::info!(session_id = %session_id, coupon = %code, "coupon redeemed"),
            Ok(false) => tracing::warn!(session_id = %session_id, coupon = %code, "coupon exhausted at redemption, booking continues"),
            Err(e) => tracing::error!(session_id = %session_id, coupon = %code, error = %e, "coupon redemption failed"),
        }
    }

    pub async fn after_failed(&self, session: &PaymentSession) {
        if let Some(reservation_id) = session.reservation_id {
            match self.reservations.release_hold(reservation_id).await {
                Ok(true) => tracing::info!(session_id = %session.id, reservation_id = %reservation_id, "reservation released after failed payment"),
                Ok(false) => {}
                Err(e) => tracing::error!(session_id = %session.id, error = %e, "failed to release reservation"),
            }
        }
    }

    pub async fn rebook(&self, session_id: Uuid) -> Result<crate::models::interview::Interview> {
        self.booking.auto_book(session_id).await
    }
}
