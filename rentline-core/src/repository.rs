use async_trait::async_trait;
use chrono::NaiveDate;

use crate::activity::{SearchHistory, Visit};
use crate::booking::{Booking, BookingStatus, NewBooking};
use crate::estate::{Estate, EstateFilter, EstatePatch, NewEstate};
use crate::pagination::PageRequest;
use crate::review::{NewReview, Review};
use crate::user::{NewUser, User};
use crate::{BookingId, CoreResult, EstateId, UserId};

/// Repository trait for accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with a validation error when the username is taken.
    async fn create_user(&self, user: NewUser) -> CoreResult<User>;

    async fn find_by_username(&self, username: &str) -> CoreResult<Option<User>>;

    async fn find_by_id(&self, id: UserId) -> CoreResult<Option<User>>;
}

/// Repository trait for estate listings
#[async_trait]
pub trait EstateRepository: Send + Sync {
    async fn create_estate(&self, estate: NewEstate) -> CoreResult<Estate>;

    async fn get_estate(&self, id: EstateId) -> CoreResult<Option<Estate>>;

    /// Owner id only, for ownership checks.
    async fn owner_of(&self, id: EstateId) -> CoreResult<Option<UserId>>;

    async fn update_estate(&self, id: EstateId, patch: &EstatePatch) -> CoreResult<Option<Estate>>;

    /// Returns `false` when nothing was deleted.
    async fn delete_estate(&self, id: EstateId) -> CoreResult<bool>;

    /// Active estates matching `filter`, ordered by id, with the total count.
    async fn list_active(
        &self,
        filter: &EstateFilter,
        page: PageRequest,
    ) -> CoreResult<(u64, Vec<Estate>)>;
}

/// Repository trait for bookings.
///
/// Writes that can produce an approved booking run the overlap check and the
/// write as one atomic step per estate.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts a pending booking after checking the estate exists, is active
    /// and has no approved booking overlapping the range.
    async fn create_pending(&self, booking: NewBooking) -> CoreResult<Booking>;

    async fn find_for_tenant(&self, id: BookingId, tenant: UserId) -> CoreResult<Option<Booking>>;

    /// Booking `id` if it belongs to an estate owned by `owner`.
    async fn find_for_landlord(&self, id: BookingId, owner: UserId) -> CoreResult<Option<Booking>>;

    /// Moves booking `id` from `from` to `to`. Fails with a validation error if
    /// the status is no longer `from`, or if `to` is approved and the stay
    /// overlaps another approved booking.
    async fn update_status(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> CoreResult<Option<Booking>>;

    async fn has_started_approved_booking(
        &self,
        estate: EstateId,
        tenant: UserId,
        today: NaiveDate,
    ) -> CoreResult<bool>;
}

/// Repository trait for reviews
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create_review(&self, review: NewReview) -> CoreResult<Review>;
}

/// Repository trait for visit and search analytics
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn record_visit(&self, estate: EstateId, visitor: UserId) -> CoreResult<Visit>;

    async fn record_search(&self, user: UserId, query: &str) -> CoreResult<SearchHistory>;

    async fn list_search_history(&self, user: UserId) -> CoreResult<Vec<SearchHistory>>;

    /// Visits to every estate owned by `owner`.
    async fn list_visits_for_owner(&self, owner: UserId) -> CoreResult<Vec<Visit>>;
}
