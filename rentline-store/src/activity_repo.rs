use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rentline_core::activity::{SearchHistory, Visit};
use rentline_core::repository::ActivityRepository;
use rentline_core::{CoreResult, EstateId, UserId};
use sqlx::PgPool;

use crate::database::internal;

pub struct StoreActivityRepository {
    pool: PgPool,
}

impl StoreActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct VisitRow {
    id: i64,
    estate_id: i64,
    visitor_id: i64,
    visited_at: DateTime<Utc>,
}

impl From<VisitRow> for Visit {
    fn from(row: VisitRow) -> Self {
        Visit {
            id: row.id,
            estate: row.estate_id,
            visitor: row.visitor_id,
            visited_at: row.visited_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SearchRow {
    id: i64,
    user_id: i64,
    query: String,
    searched_at: DateTime<Utc>,
}

impl From<SearchRow> for SearchHistory {
    fn from(row: SearchRow) -> Self {
        SearchHistory {
            id: row.id,
            user: row.user_id,
            query: row.query,
            searched_at: row.searched_at,
        }
    }
}

#[async_trait]
impl ActivityRepository for StoreActivityRepository {
    async fn record_visit(&self, estate: EstateId, visitor: UserId) -> CoreResult<Visit> {
        let row = sqlx::query_as::<_, VisitRow>(
            r#"
            INSERT INTO visits (estate_id, visitor_id)
            VALUES ($1, $2)
            RETURNING id, estate_id, visitor_id, visited_at
            "#,
        )
        .bind(estate)
        .bind(visitor)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;

        Ok(row.into())
    }

    async fn record_search(&self, user: UserId, query: &str) -> CoreResult<SearchHistory> {
        let row = sqlx::query_as::<_, SearchRow>(
            r#"
            INSERT INTO search_history (user_id, query)
            VALUES ($1, $2)
            RETURNING id, user_id, query, searched_at
            "#,
        )
        .bind(user)
        .bind(query)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;

        Ok(row.into())
    }

    async fn list_search_history(&self, user: UserId) -> CoreResult<Vec<SearchHistory>> {
        let rows = sqlx::query_as::<_, SearchRow>(
            "SELECT id, user_id, query, searched_at FROM search_history WHERE user_id = $1 ORDER BY id",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        Ok(rows.into_iter().map(SearchHistory::from).collect())
    }

    async fn list_visits_for_owner(&self, owner: UserId) -> CoreResult<Vec<Visit>> {
        let rows = sqlx::query_as::<_, VisitRow>(
            r#"
            SELECT v.id, v.estate_id, v.visitor_id, v.visited_at
            FROM visits v
            JOIN estates e ON e.id = v.estate_id
            WHERE e.owner_id = $1
            ORDER BY v.id
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        Ok(rows.into_iter().map(Visit::from).collect())
    }
}
