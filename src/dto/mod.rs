pub mod interview_dto;
pub mod interviewer_dto;
pub mod matching_dto;
pub mod payment_dto;
pub mod profile_dto;
pub mod reservation_dto;
pub mod resume_review_dto;
pub mod webhook_dto;
