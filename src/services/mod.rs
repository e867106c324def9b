pub mod add_on_service;
pub mod audit_service;
pub mod booking_service;
pub mod email_templates;
pub mod interviewer_service;
pub mod maintenance_service;
pub mod matching_service;
pub mod notification_service;
pub mod payment_gateway;
pub mod payment_service;
pub mod pricing_service;
pub mod profile_service;
pub mod reservation_service;
pub mod resume_review_service;
pub mod webhook_service;
