use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::resume_review::REVIEW_STATUSES;

fn known_status(status: &str) -> Result<(), ValidationError> {
    if REVIEW_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_review_status"))
    }
}

/// Text fields of the multipart resume-review submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResumeReviewForm {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub target_role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateReviewStatusRequest {
    #[validate(custom(function = "known_status"))]
    pub status: String,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_must_be_known() {
        let ok = UpdateReviewStatusRequest { status: "processing".into(), notes: None };
        assert!(ok.validate().is_ok());
        let bad = UpdateReviewStatusRequest { status: "archived".into(), notes: None };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn form_requires_name_and_email() {
        let empty = ResumeReviewForm::default();
        assert!(empty.validate().is_err());
        let form = ResumeReviewForm {
            full_name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            target_role: Some("Backend Engineer".into()),
        };
        assert!(form.validate().is_ok());
    }
}
