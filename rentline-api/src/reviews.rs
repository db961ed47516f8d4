use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};
use chrono::Utc;
use rentline_core::policy::{authorize, Action};
use rentline_core::review::{ensure_eligible, Review, ReviewRequest};
use tracing::info;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::Caller;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/review/create", post(create_review))
}

async fn create_review(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    authorize(Action::CreateReview, caller.role)?;
    req.validate()?;

    if state.estates.owner_of(req.estate).await?.is_none() {
        return Err(AppError::ValidationError(format!(
            "estate: Invalid pk \"{}\" - object does not exist.",
            req.estate
        )));
    }

    let today = Utc::now().date_naive();
    let eligible = state
        .bookings
        .has_started_approved_booking(req.estate, caller.id, today)
        .await?;
    ensure_eligible(eligible)?;

    let review = state.reviews.create_review(req.into_new(caller.id)).await?;
    info!(review_id = review.id, estate_id = review.estate, "review created");

    Ok((StatusCode::CREATED, Json(review)))
}
