pub mod admin;
pub mod catalog;
pub mod health;
pub mod interviewers;
pub mod interviews;
pub mod matching;
pub mod payments;
pub mod profile;
pub mod reservations;
pub mod resume_reviews;
pub mod webhook;
