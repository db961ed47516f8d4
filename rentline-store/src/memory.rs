//! In-process store implementing every repository trait.
//!
//! One mutex guards all tables, so each repository call is atomic. This gives
//! the same overlap guarantee as the row lock plus exclusion constraint in
//! PostgreSQL.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rentline_core::activity::{SearchHistory, Visit};
use rentline_core::booking::{ensure_no_overlap, Booking, BookingStatus, DateRange, NewBooking};
use rentline_core::estate::{Estate, EstateFilter, EstatePatch, NewEstate};
use rentline_core::pagination::PageRequest;
use rentline_core::repository::{
    ActivityRepository, BookingRepository, EstateRepository, ReviewRepository, UserRepository,
};
use rentline_core::review::{NewReview, Review};
use rentline_core::user::{NewUser, User};
use rentline_core::{BookingId, CoreError, CoreResult, EstateId, UserId};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct Sequences {
    users: i64,
    estates: i64,
    bookings: i64,
    reviews: i64,
    visits: i64,
    searches: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Default)]
struct Tables {
    seq: Sequences,
    users: BTreeMap<UserId, User>,
    estates: BTreeMap<EstateId, Estate>,
    bookings: BTreeMap<BookingId, Booking>,
    reviews: Vec<Review>,
    visits: Vec<Visit>,
    searches: Vec<SearchHistory>,
}

impl Tables {
    fn approved_ranges(&self, estate: EstateId, except: Option<BookingId>) -> Vec<DateRange> {
        self.bookings
            .values()
            .filter(|b| b.estate == estate && b.status == BookingStatus::Approved)
            .filter(|b| Some(b.id) != except)
            .map(Booking::range)
            .collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> CoreResult<User> {
        let mut t = self.tables.lock().await;
        if t.users.values().any(|u| u.username == user.username) {
            return Err(CoreError::validation(
                "username: A user with that username already exists.",
            ));
        }
        let id = next(&mut t.seq.users);
        let user = User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            date_joined: Utc::now(),
        };
        t.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> CoreResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.get(&id).cloned())
    }
}

#[async_trait]
impl EstateRepository for MemoryStore {
    async fn create_estate(&self, estate: NewEstate) -> CoreResult<Estate> {
        let mut t = self.tables.lock().await;
        let id = next(&mut t.seq.estates);
        let estate = Estate {
            id,
            title: estate.title,
            description: estate.description,
            location: estate.location,
            price: estate.price,
            is_active: estate.is_active,
            owner: estate.owner,
        };
        t.estates.insert(id, estate.clone());
        Ok(estate)
    }

    async fn get_estate(&self, id: EstateId) -> CoreResult<Option<Estate>> {
        let t = self.tables.lock().await;
        Ok(t.estates.get(&id).cloned())
    }

    async fn owner_of(&self, id: EstateId) -> CoreResult<Option<UserId>> {
        let t = self.tables.lock().await;
        Ok(t.estates.get(&id).map(|e| e.owner))
    }

    async fn update_estate(&self, id: EstateId, patch: &EstatePatch) -> CoreResult<Option<Estate>> {
        let mut t = self.tables.lock().await;
        Ok(t.estates.get_mut(&id).map(|estate| {
            patch.apply(estate);
            estate.clone()
        }))
    }

    async fn delete_estate(&self, id: EstateId) -> CoreResult<bool> {
        let mut t = self.tables.lock().await;
        if t.estates.remove(&id).is_none() {
            return Ok(false);
        }
        t.bookings.retain(|_, b| b.estate != id);
        t.reviews.retain(|r| r.estate != id);
        t.visits.retain(|v| v.estate != id);
        Ok(true)
    }

    async fn list_active(
        &self,
        filter: &EstateFilter,
        page: PageRequest,
    ) -> CoreResult<(u64, Vec<Estate>)> {
        let t = self.tables.lock().await;
        let matching: Vec<&Estate> = t.estates.values().filter(|e| filter.matches(e)).collect();
        let results = matching
            .iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|e| (*e).clone())
            .collect();
        Ok((matching.len() as u64, results))
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_pending(&self, booking: NewBooking) -> CoreResult<Booking> {
        let mut t = self.tables.lock().await;
        match t.estates.get(&booking.estate) {
            None => {
                return Err(CoreError::validation(format!(
                    "estate: Invalid pk \"{}\" - object does not exist.",
                    booking.estate
                )))
            }
            Some(estate) if !estate.is_active => {
                return Err(CoreError::validation("estate: This estate is not accepting bookings."))
            }
            Some(_) => {}
        }

        ensure_no_overlap(&booking.range, &t.approved_ranges(booking.estate, None))?;

        let id = next(&mut t.seq.bookings);
        let booking = Booking {
            id,
            estate: booking.estate,
            tenant: booking.tenant,
            check_in: booking.range.check_in(),
            check_out: booking.range.check_out(),
            status: BookingStatus::Pending,
        };
        t.bookings.insert(id, booking.clone());
        Ok(booking)
    }

    async fn find_for_tenant(&self, id: BookingId, tenant: UserId) -> CoreResult<Option<Booking>> {
        let t = self.tables.lock().await;
        Ok(t.bookings.get(&id).filter(|b| b.tenant == tenant).cloned())
    }

    async fn find_for_landlord(&self, id: BookingId, owner: UserId) -> CoreResult<Option<Booking>> {
        let t = self.tables.lock().await;
        Ok(t
            .bookings
            .get(&id)
            .filter(|b| t.estates.get(&b.estate).is_some_and(|e| e.owner == owner))
            .cloned())
    }

    async fn update_status(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> CoreResult<Option<Booking>> {
        let mut t = self.tables.lock().await;
        let Some(current) = t.bookings.get(&id).cloned() else {
            return Ok(None);
        };

        if current.status != from {
            return Err(CoreError::validation(format!(
                "Booking is {} and can no longer move to {}.",
                current.status, to
            )));
        }

        if to == BookingStatus::Approved {
            ensure_no_overlap(&current.range(), &t.approved_ranges(current.estate, Some(id)))?;
        }

        let updated = Booking { status: to, ..current };
        t.bookings.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn has_started_approved_booking(
        &self,
        estate: EstateId,
        tenant: UserId,
        today: NaiveDate,
    ) -> CoreResult<bool> {
        let t = self.tables.lock().await;
        Ok(t.bookings.values().any(|b| b.grants_review(estate, tenant, today)))
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn create_review(&self, review: NewReview) -> CoreResult<Review> {
        let mut t = self.tables.lock().await;
        if !t.estates.contains_key(&review.estate) {
            return Err(CoreError::validation(format!(
                "estate: Invalid pk \"{}\" - object does not exist.",
                review.estate
            )));
        }
        let review = Review {
            id: next(&mut t.seq.reviews),
            estate: review.estate,
            tenant: review.tenant,
            score: review.score,
            comment: review.comment,
            created_at: Utc::now(),
        };
        t.reviews.push(review.clone());
        Ok(review)
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn record_visit(&self, estate: EstateId, visitor: UserId) -> CoreResult<Visit> {
        let mut t = self.tables.lock().await;
        let visit = Visit {
            id: next(&mut t.seq.visits),
            estate,
            visitor,
            visited_at: Utc::now(),
        };
        t.visits.push(visit.clone());
        Ok(visit)
    }

    async fn record_search(&self, user: UserId, query: &str) -> CoreResult<SearchHistory> {
        let mut t = self.tables.lock().await;
        let entry = SearchHistory {
            id: next(&mut t.seq.searches),
            user,
            query: query.to_string(),
            searched_at: Utc::now(),
        };
        t.searches.push(entry.clone());
        Ok(entry)
    }

    async fn list_search_history(&self, user: UserId) -> CoreResult<Vec<SearchHistory>> {
        let t = self.tables.lock().await;
        Ok(t.searches.iter().filter(|s| s.user == user).cloned().collect())
    }

    async fn list_visits_for_owner(&self, owner: UserId) -> CoreResult<Vec<Visit>> {
        let t = self.tables.lock().await;
        Ok(t
            .visits
            .iter()
            .filter(|v| t.estates.get(&v.estate).is_some_and(|e| e.owner == owner))
            .cloned()
            .collect())
    }
}
