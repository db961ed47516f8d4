use async_trait::async_trait;
use chrono::NaiveDate;
use rentline_core::booking::{
    ensure_no_overlap, Booking, BookingStatus, DateRange, NewBooking, OVERLAP_MESSAGE,
};
use rentline_core::repository::BookingRepository;
use rentline_core::{BookingId, CoreError, CoreResult, EstateId, UserId};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::database::{internal, violation, Violation};

const BOOKING_COLUMNS: &str = "b.id, b.estate_id, b.tenant_id, b.check_in, b.check_out, b.status";

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Locks the estate row so overlap checks on one estate run one at a time.
    async fn lock_estate(
        tx: &mut Transaction<'_, Postgres>,
        estate: EstateId,
    ) -> CoreResult<Option<bool>> {
        sqlx::query_scalar::<_, bool>("SELECT is_active FROM estates WHERE id = $1 FOR UPDATE")
            .bind(estate)
            .fetch_optional(&mut **tx)
            .await
            .map_err(internal)
    }

    async fn approved_ranges(
        tx: &mut Transaction<'_, Postgres>,
        estate: EstateId,
        except: Option<BookingId>,
    ) -> CoreResult<Vec<DateRange>> {
        let rows = sqlx::query_as::<_, (NaiveDate, NaiveDate)>(
            r#"
            SELECT check_in, check_out FROM bookings
            WHERE estate_id = $1 AND status = 'approved' AND ($2::BIGINT IS NULL OR id <> $2)
            "#,
        )
        .bind(estate)
        .bind(except)
        .fetch_all(&mut **tx)
        .await
        .map_err(internal)?;

        rows.into_iter()
            .map(|(check_in, check_out)| DateRange::new(check_in, check_out))
            .collect()
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    estate_id: i64,
    tenant_id: i64,
    check_in: NaiveDate,
    check_out: NaiveDate,
    status: String,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            estate: row.estate_id,
            tenant: row.tenant_id,
            check_in: row.check_in,
            check_out: row.check_out,
            status: row.status.parse().map_err(CoreError::internal)?,
        })
    }
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_pending(&self, booking: NewBooking) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        match Self::lock_estate(&mut tx, booking.estate).await? {
            None => {
                return Err(CoreError::validation(format!(
                    "estate: Invalid pk \"{}\" - object does not exist.",
                    booking.estate
                )))
            }
            Some(false) => {
                return Err(CoreError::validation("estate: This estate is not accepting bookings."))
            }
            Some(true) => {}
        }

        let approved = Self::approved_ranges(&mut tx, booking.estate, None).await?;
        ensure_no_overlap(&booking.range, &approved)?;

        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings (estate_id, tenant_id, check_in, check_out, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING id, estate_id, tenant_id, check_in, check_out, status
            "#,
        )
        .bind(booking.estate)
        .bind(booking.tenant)
        .bind(booking.range.check_in())
        .bind(booking.range.check_out())
        .fetch_one(&mut *tx)
        .await
        .map_err(internal)?;

        tx.commit().await.map_err(internal)?;

        row.try_into()
    }

    async fn find_for_tenant(&self, id: BookingId, tenant: UserId) -> CoreResult<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = $1 AND b.tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?
        .map(Booking::try_from)
        .transpose()
    }

    async fn find_for_landlord(&self, id: BookingId, owner: UserId) -> CoreResult<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings b
            JOIN estates e ON e.id = b.estate_id
            WHERE b.id = $1 AND e.owner_id = $2
            "#
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?
        .map(Booking::try_from)
        .transpose()
    }

    async fn update_status(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> CoreResult<Option<Booking>> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        // Estate before booking, the same order create_pending takes.
        let estate = sqlx::query_scalar::<_, i64>("SELECT estate_id FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal)?;
        let Some(estate) = estate else {
            return Ok(None);
        };
        Self::lock_estate(&mut tx, estate).await?;

        let current = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(internal)?;

        let Some(current) = current else {
            return Ok(None);
        };
        let current = Booking::try_from(current)?;

        if current.status != from {
            debug!(booking_id = id, status = %current.status, "status moved before update");
            return Err(CoreError::validation(format!(
                "Booking is {} and can no longer move to {}.",
                current.status, to
            )));
        }

        if to == BookingStatus::Approved {
            let approved = Self::approved_ranges(&mut tx, current.estate, Some(id)).await?;
            ensure_no_overlap(&current.range(), &approved)?;
        }

        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings SET status = $2 WHERE id = $1
            RETURNING id, estate_id, tenant_id, check_in, check_out, status
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match violation(&e) {
            Some(Violation::Exclusion) => CoreError::validation(OVERLAP_MESSAGE),
            _ => internal(e),
        })?;

        tx.commit().await.map_err(internal)?;

        Booking::try_from(row).map(Some)
    }

    async fn has_started_approved_booking(
        &self,
        estate: EstateId,
        tenant: UserId,
        today: NaiveDate,
    ) -> CoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM bookings
                WHERE estate_id = $1 AND tenant_id = $2 AND status = 'approved' AND check_in <= $3
            )
            "#,
        )
        .bind(estate)
        .bind(tenant)
        .bind(today)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)
    }
}

/// These run against a real Postgres and are skipped when `DATABASE_URL` is unset.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::DatabaseConfig;
    use crate::{DbClient, StoreEstateRepository, StoreUserRepository};
    use chrono::Utc;
    use rentline_core::estate::NewEstate;
    use rentline_core::repository::{EstateRepository, UserRepository};
    use rentline_core::user::NewUser;
    use rentline_core::Role;
    use rentline_shared::Masked;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicU32, Ordering};

    static NEXT: AtomicU32 = AtomicU32::new(0);

    struct Fixture {
        repo: StoreBookingRepository,
        pool: PgPool,
        estate: EstateId,
        tenant: UserId,
    }

    async fn fixture() -> Option<Fixture> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let db = DbClient::new(&DatabaseConfig {
            url,
            max_connections: 5,
        })
        .await
        .unwrap();
        db.migrate().await.unwrap();

        let suffix = format!(
            "{}_{}",
            Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        );
        let users = StoreUserRepository::new(db.pool.clone());
        let mut ids = Vec::new();
        for (name, role) in [("landlord", Role::Landlord), ("tenant", Role::Tenant)] {
            let user = users
                .create_user(NewUser {
                    username: format!("{}_{}", name, suffix),
                    password_hash: Masked::new("x".to_string()),
                    role,
                })
                .await
                .unwrap();
            ids.push(user.id);
        }

        let estate = StoreEstateRepository::new(db.pool.clone())
            .create_estate(NewEstate {
                title: "Loft".to_string(),
                description: "Bright loft".to_string(),
                location: "Riga".to_string(),
                price: Decimal::from(100),
                is_active: true,
                owner: ids[0],
            })
            .await
            .unwrap();

        Some(Fixture {
            repo: StoreBookingRepository::new(db.pool.clone()),
            pool: db.pool,
            estate: estate.id,
            tenant: ids[1],
        })
    }

    fn stay(f: &Fixture, check_in: &str, check_out: &str) -> NewBooking {
        NewBooking {
            estate: f.estate,
            tenant: f.tenant,
            range: DateRange::new(check_in.parse().unwrap(), check_out.parse().unwrap()).unwrap(),
        }
    }

    async fn approve(f: &Fixture, id: BookingId) -> CoreResult<Option<Booking>> {
        f.repo
            .update_status(id, BookingStatus::Pending, BookingStatus::Approved)
            .await
    }

    #[tokio::test]
    async fn test_only_approved_bookings_block_new_requests() {
        let Some(f) = fixture().await else { return };

        let first = f.repo.create_pending(stay(&f, "2031-03-01", "2031-03-05")).await.unwrap();
        let second = f.repo.create_pending(stay(&f, "2031-03-03", "2031-03-07")).await.unwrap();
        assert_eq!(second.status, BookingStatus::Pending);

        let approved = approve(&f, first.id).await.unwrap().unwrap();
        assert_eq!(approved.status, BookingStatus::Approved);

        let err = f
            .repo
            .create_pending(stay(&f, "2031-03-04", "2031-03-06"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(ref m) if m == OVERLAP_MESSAGE));

        // Back-to-back stays share only the boundary day.
        assert!(f.repo.create_pending(stay(&f, "2031-03-05", "2031-03-08")).await.is_ok());

        let err = approve(&f, second.id).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_status_must_still_match_when_updating() {
        let Some(f) = fixture().await else { return };

        let booking = f.repo.create_pending(stay(&f, "2031-04-01", "2031-04-03")).await.unwrap();
        f.repo
            .update_status(booking.id, BookingStatus::Pending, BookingStatus::Declined)
            .await
            .unwrap();

        assert!(matches!(
            approve(&f, booking.id).await,
            Err(CoreError::ValidationError(_))
        ));
        assert!(approve(&f, i64::MAX).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_approvals_admit_one_overlapping_booking() {
        let Some(f) = fixture().await else { return };

        let a = f.repo.create_pending(stay(&f, "2031-05-01", "2031-05-10")).await.unwrap();
        let b = f.repo.create_pending(stay(&f, "2031-05-05", "2031-05-12")).await.unwrap();

        let (ra, rb) = tokio::join!(approve(&f, a.id), approve(&f, b.id));
        let approved = [&ra, &rb]
            .iter()
            .filter(|r| matches!(r, Ok(Some(booking)) if booking.status == BookingStatus::Approved))
            .count();
        assert_eq!(approved, 1);
        assert!(
            matches!(ra, Err(CoreError::ValidationError(_)))
                || matches!(rb, Err(CoreError::ValidationError(_)))
        );
    }

    #[tokio::test]
    async fn test_schema_rejects_overlapping_approvals_written_directly() {
        let Some(f) = fixture().await else { return };

        let a = f.repo.create_pending(stay(&f, "2031-06-01", "2031-06-05")).await.unwrap();
        let b = f.repo.create_pending(stay(&f, "2031-06-02", "2031-06-04")).await.unwrap();
        approve(&f, a.id).await.unwrap();

        let err = sqlx::query("UPDATE bookings SET status = 'approved' WHERE id = $1")
            .bind(b.id)
            .execute(&f.pool)
            .await
            .unwrap_err();
        assert_eq!(violation(&err), Some(Violation::Exclusion));
    }
}
