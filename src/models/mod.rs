pub mod add_on;
pub mod audit_log;
pub mod coupon;
pub mod email_outbox;
pub mod interview;
pub mod interviewer;
pub mod payment_order;
pub mod payment_session;
pub mod plan;
pub mod profile;
pub mod resume_review;
pub mod time_block;
pub mod time_slot;
