pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::{
    auth::{require_admin, require_bearer_auth},
    cors::permissive_cors,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::services::{
    add_on_service::AddOnService,
    audit_service::AuditService,
    booking_service::BookingService,
    interviewer_service::InterviewerService,
    maintenance_service::MaintenanceService,
    matching_service::MatchingService,
    notification_service::{EmailRelay, NotificationService},
    payment_gateway::PaymentGateway,
    payment_service::PaymentService,
    pricing_service::CouponService,
    profile_service::ProfileService,
    reservation_service::ReservationService,
    resume_review_service::ResumeReviewService,
    webhook_service::WebhookService,
};

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub coupon_service: CouponService,
    pub add_on_service: AddOnService,
    pub matching_service: MatchingService,
    pub reservation_service: ReservationService,
    pub interviewer_service: InterviewerService,
    pub profile_service: ProfileService,
    pub notification_service: NotificationService,
    pub audit_service: AuditService,
    pub booking_service: BookingService,
    pub payment_service: PaymentService,
    pub resume_review_service: ResumeReviewService,
    pub webhook_service: WebhookService,
    pub maintenance_service: MaintenanceService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let gateway = PaymentGateway::new(config.payment.clone());

        let coupon_service = CouponService::new(pool.clone());
        let add_on_service = AddOnService::new(pool.clone());
        let matching_service = MatchingService::new(pool.clone());
        let reservation_service = ReservationService::new(pool.clone());
        let interviewer_service = InterviewerService::new(pool.clone());
        let profile_service = ProfileService::new(pool.clone());
        let notification_service = NotificationService::new(pool.clone(), EmailRelay::from_config());
        let audit_service = AuditService::new(pool.clone());
        let booking_service = BookingService::new(
            pool.clone(),
            interviewer_service.clone(),
            profile_service.clone(),
            notification_service.clone(),
            audit_service.clone(),
        );
        let payment_service = PaymentService::new(
            pool.clone(),
            gateway.clone(),
            coupon_service.clone(),
            add_on_service.clone(),
            reservation_service.clone(),
            interviewer_service.clone(),
            booking_service.clone(),
            audit_service.clone(),
        );
        let resume_review_service = ResumeReviewService::new(
            pool.clone(),
            gateway,
            notification_service.clone(),
            audit_service.clone(),
        );
        let webhook_service = WebhookService::new(
            pool.clone(),
            payment_service.clone(),
            resume_review_service.clone(),
        );
        let maintenance_service = MaintenanceService::new(
            pool.clone(),
            reservation_service.clone(),
            booking_service.clone(),
            notification_service.clone(),
        );

        Self {
            pool,
            coupon_service,
            add_on_service,
            matching_service,
            reservation_service,
            interviewer_service,
            profile_service,
            notification_service,
            audit_service,
            booking_service,
            payment_service,
            resume_review_service,
            webhook_service,
            maintenance_service,
        }
    }
}

/// Full HTTP surface: public, bearer-authenticated and admin routers.
pub fn build_router(state: AppState) -> Router {
    let config = crate::config::get_config();

    let public_api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/add-ons", get(routes::catalog::list_add_ons))
        .route("/api/coupons/validate", post(routes::catalog::validate_coupon))
        .route("/api/webhooks/payment", post(routes::webhook::payment_webhook))
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::new(config.public_rps),
            rps_middleware,
        ));

    let user_api = Router::new()
        .route("/api/matching", post(routes::matching::find_match))
        .route("/api/reservations", post(routes::reservations::create_reservation))
        .route(
            "/api/reservations/:id",
            delete(routes::reservations::release_reservation),
        )
        .route("/api/payments/sessions", post(routes::payments::create_session))
        .route("/api/payments/sessions/:id", get(routes::payments::get_session))
        .route("/api/interviews", get(routes::interviews::list_interviews))
        .route("/api/interviews/:id", get(routes::interviews::get_interview))
        .route(
            "/api/interviews/:id/reschedule",
            post(routes::interviews::reschedule_interview),
        )
        .route(
            "/api/interviews/:id/cancel",
            post(routes::interviews::cancel_interview),
        )
        .route(
            "/api/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        .route(
            "/api/interviewers/me/availability",
            put(routes::interviewers::update_availability),
        )
        .route(
            "/api/interviewers/me/blocks",
            get(routes::interviewers::list_blocks).post(routes::interviewers::create_block),
        )
        .route(
            "/api/interviewers/me/blocks/:id",
            delete(routes::interviewers::delete_block),
        )
        .route("/api/resume-reviews", post(routes::resume_reviews::create_review))
        .route("/api/resume-reviews/:id", get(routes::resume_reviews::get_review))
        .route(
            "/api/resume-reviews/:id/payment",
            post(routes::resume_reviews::start_payment),
        )
        .route_layer(axum::middleware::from_fn(require_bearer_auth))
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::new(config.api_rps),
            rps_middleware,
        ));

    let admin_api = Router::new()
        .route(
            "/api/admin/reservations/cleanup",
            post(routes::admin::cleanup_reservations),
        )
        .route(
            "/api/admin/payments/sessions/:id/book",
            post(routes::admin::rebook_session),
        )
        .route(
            "/api/admin/interviewers/:id/eligibility",
            patch(routes::admin::set_eligibility),
        )
        .route(
            "/api/admin/resume-reviews/:id/status",
            patch(routes::admin::update_review_status),
        )
        .route(
            "/api/admin/resume-reviews/:id/report",
            post(routes::admin::upload_review_report),
        )
        .route_layer(axum::middleware::from_fn(require_admin))
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::new(config.api_rps),
            rps_middleware,
        ));

    public_api
        .merge(user_api)
        .merge(admin_api)
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir))
        .with_state(state)
        .layer(permissive_cors())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
