use tracing::info;

use crate::validation::{ValidationError, ValidationResult};

/// Review that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedReview {
    pub experience_id: String,
    pub rating: u8,
    pub comment: String,
}

/// State of the "Leave a Review" form. A rating of 0 means none picked yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewDraft {
    pub rating: u8,
    pub comment: String,
}

impl ReviewDraft {
    pub fn validate(&self) -> ValidationResult<()> {
        match self.rating {
            0 => return Err(ValidationError::MissingRating),
            1..=5 => {}
            other => return Err(ValidationError::RatingOutOfRange(other)),
        }
        if self.comment.trim().is_empty() {
            return Err(ValidationError::MissingComment);
        }
        Ok(())
    }

    /// Validate, log the review and reset the form. On error the draft is
    /// left as it was.
    pub fn submit(&mut self, experience_id: &str) -> ValidationResult<SubmittedReview> {
        self.validate()?;
        let review = SubmittedReview {
            experience_id: experience_id.to_string(),
            rating: self.rating,
            comment: self.comment.trim().to_string(),
        };
        info!(
            "New review for {}: {} stars, {:?}",
            review.experience_id, review.rating, review.comment
        );
        *self = ReviewDraft::default();
        Ok(review)
    }
}
