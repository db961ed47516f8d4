use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rentline_core::repository::ReviewRepository;
use rentline_core::review::{NewReview, Review};
use rentline_core::{CoreError, CoreResult};
use sqlx::PgPool;

use crate::database::{internal, violation, Violation};

pub struct StoreReviewRepository {
    pool: PgPool,
}

impl StoreReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    estate_id: i64,
    tenant_id: i64,
    score: i32,
    comment: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl ReviewRepository for StoreReviewRepository {
    async fn create_review(&self, review: NewReview) -> CoreResult<Review> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO reviews (estate_id, tenant_id, score, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, estate_id, tenant_id, score, comment, created_at
            "#,
        )
        .bind(review.estate)
        .bind(review.tenant)
        .bind(review.score)
        .bind(&review.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Some(Violation::ForeignKey) => CoreError::validation(format!(
                "estate: Invalid pk \"{}\" - object does not exist.",
                review.estate
            )),
            _ => internal(e),
        })?;

        Ok(Review {
            id: row.id,
            estate: row.estate_id,
            tenant: row.tenant_id,
            score: row.score,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}
