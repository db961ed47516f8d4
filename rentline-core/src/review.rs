use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, EstateId, UserId};

pub const NOT_ELIGIBLE_MESSAGE: &str =
    "You can only review estates you have booked and checked into.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: i64,
    pub estate: EstateId,
    pub tenant: UserId,
    pub score: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub estate: EstateId,
    pub score: i32,
    pub comment: String,
}

impl ReviewRequest {
    pub fn validate(&self) -> CoreResult<()> {
        if self.score < 0 {
            return Err(CoreError::validation(
                "score: Ensure this value is greater than or equal to 0.",
            ));
        }
        if self.comment.trim().is_empty() {
            return Err(CoreError::validation("comment: This field may not be blank."));
        }
        Ok(())
    }

    pub fn into_new(self, tenant: UserId) -> NewReview {
        NewReview {
            estate: self.estate,
            tenant,
            score: self.score,
            comment: self.comment,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub estate: EstateId,
    pub tenant: UserId,
    pub score: i32,
    pub comment: String,
}

/// Second half of the review gate; the role half lives in the policy table.
pub fn ensure_eligible(has_started_approved_booking: bool) -> CoreResult<()> {
    if has_started_approved_booking {
        Ok(())
    } else {
        Err(CoreError::validation(NOT_ELIGIBLE_MESSAGE))
    }
}
