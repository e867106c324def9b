pub mod token;
pub mod upload;
