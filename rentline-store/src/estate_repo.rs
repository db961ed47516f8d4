use async_trait::async_trait;
use rentline_core::estate::{normalize_price, Estate, EstateFilter, EstatePatch, NewEstate};
use rentline_core::pagination::PageRequest;
use rentline_core::repository::EstateRepository;
use rentline_core::{CoreResult, EstateId, UserId};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::internal;

const ESTATE_COLUMNS: &str = "id, title, description, location, price, is_active, owner_id";

pub struct StoreEstateRepository {
    pool: PgPool,
}

impl StoreEstateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EstateRow {
    id: i64,
    title: String,
    description: String,
    location: String,
    price: Decimal,
    is_active: bool,
    owner_id: i64,
}

impl From<EstateRow> for Estate {
    fn from(row: EstateRow) -> Self {
        Estate {
            id: row.id,
            title: row.title,
            description: row.description,
            location: row.location,
            price: row.price,
            is_active: row.is_active,
            owner: row.owner_id,
        }
    }
}

/// Appends the listing predicate. Always starts with `WHERE is_active`.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &EstateFilter) {
    qb.push(" WHERE is_active");
    if let Some(title) = &filter.title {
        qb.push(" AND title ILIKE ").push_bind(contains_pattern(title));
    }
    if let Some(location) = &filter.location {
        qb.push(" AND location ILIKE ").push_bind(contains_pattern(location));
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
}

fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl EstateRepository for StoreEstateRepository {
    async fn create_estate(&self, estate: NewEstate) -> CoreResult<Estate> {
        let row = sqlx::query_as::<_, EstateRow>(&format!(
            r#"
            INSERT INTO estates (title, description, location, price, is_active, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ESTATE_COLUMNS}
            "#
        ))
        .bind(&estate.title)
        .bind(&estate.description)
        .bind(&estate.location)
        .bind(estate.price)
        .bind(estate.is_active)
        .bind(estate.owner)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;

        Ok(row.into())
    }

    async fn get_estate(&self, id: EstateId) -> CoreResult<Option<Estate>> {
        let row = sqlx::query_as::<_, EstateRow>(&format!(
            "SELECT {ESTATE_COLUMNS} FROM estates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;

        Ok(row.map(Estate::from))
    }

    async fn owner_of(&self, id: EstateId) -> CoreResult<Option<UserId>> {
        sqlx::query_scalar::<_, i64>("SELECT owner_id FROM estates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)
    }

    async fn update_estate(&self, id: EstateId, patch: &EstatePatch) -> CoreResult<Option<Estate>> {
        let row = sqlx::query_as::<_, EstateRow>(&format!(
            r#"
            UPDATE estates SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                price = COALESCE($5, price),
                is_active = COALESCE($6, is_active)
            WHERE id = $1
            RETURNING {ESTATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.location.as_deref())
        .bind(patch.price.map(normalize_price))
        .bind(patch.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;

        Ok(row.map(Estate::from))
    }

    async fn delete_estate(&self, id: EstateId) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM estates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(internal)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_active(
        &self,
        filter: &EstateFilter,
        page: PageRequest,
    ) -> CoreResult<(u64, Vec<Estate>)> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM estates");
        push_filter(&mut count_query, filter);
        let count = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;

        let mut list_query =
            QueryBuilder::<Postgres>::new(format!("SELECT {ESTATE_COLUMNS} FROM estates"));
        push_filter(&mut list_query, filter);
        list_query
            .push(" ORDER BY id LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = list_query
            .build_query_as::<EstateRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;

        Ok((count.max(0) as u64, rows.into_iter().map(Estate::from).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Riga"), "%Riga%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_filter_sql() {
        let filter = EstateFilter {
            location: Some("Riga".into()),
            max_price: Some(Decimal::from(120)),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM estates");
        push_filter(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM estates WHERE is_active AND location ILIKE $1 AND price <= $2"
        );
    }
}
