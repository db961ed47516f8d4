use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use rentline_core::booking::{Booking, BookingRequest, Party, StatusChange};
use rentline_core::policy::{authorize, Action, Scope};
use rentline_core::{BookingId, Role};
use tracing::info;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::Caller;
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFoundError("No Booking matches the given query.".to_string())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/booking/create", post(create_booking))
        .route("/booking/{id}", get(get_booking))
        .route("/booking/{id}/status", patch(update_status))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(req): ApiJson<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    authorize(Action::CreateBooking, caller.role)?;

    let booking = state.bookings.create_pending(req.into_new(caller.id)?).await?;
    info!(
        booking_id = booking.id,
        estate_id = booking.estate,
        tenant = caller.id,
        "booking requested"
    );

    Ok((StatusCode::CREATED, Json(booking)))
}

/// Looks a booking up from the caller's side of it; anything else is a 404.
async fn find_scoped(
    state: &AppState,
    caller: Caller,
    id: BookingId,
    scope: Scope,
) -> Result<(Booking, Party), AppError> {
    let found = match scope {
        Scope::Granted(Role::Tenant) => state
            .bookings
            .find_for_tenant(id, caller.id)
            .await?
            .map(|b| (b, Party::Tenant)),
        Scope::Granted(Role::Landlord) => state
            .bookings
            .find_for_landlord(id, caller.id)
            .await?
            .map(|b| (b, Party::Landlord)),
        Scope::Granted(Role::Root) | Scope::Empty => None,
    };

    found.ok_or_else(not_found)
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<BookingId>,
) -> Result<Json<Booking>, AppError> {
    let scope = authorize(Action::RetrieveBooking, caller.role)?;
    let (booking, _) = find_scoped(&state, caller, id, scope).await?;

    Ok(Json(booking))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<BookingId>,
    ApiJson(change): ApiJson<StatusChange>,
) -> Result<Json<Booking>, AppError> {
    let scope = authorize(Action::UpdateBookingStatus, caller.role)?;
    let (current, party) = find_scoped(&state, caller, id, scope).await?;

    current.status.ensure_transition(change.status, party)?;

    let booking = state
        .bookings
        .update_status(id, current.status, change.status)
        .await?
        .ok_or_else(not_found)?;
    info!(
        booking_id = id,
        from = %current.status,
        to = %booking.status,
        "booking status changed"
    );

    Ok(Json(booking))
}
