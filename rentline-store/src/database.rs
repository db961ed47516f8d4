use rentline_core::CoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const EXCLUSION_VIOLATION: &str = "23P01";

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Constraint violations the schema enforces on behalf of the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    ForeignKey,
    Exclusion,
}

pub(crate) fn violation(err: &sqlx::Error) -> Option<Violation> {
    let code = err.as_database_error()?.code()?;
    match code.as_ref() {
        UNIQUE_VIOLATION => Some(Violation::Unique),
        FOREIGN_KEY_VIOLATION => Some(Violation::ForeignKey),
        EXCLUSION_VIOLATION => Some(Violation::Exclusion),
        _ => None,
    }
}

pub(crate) fn internal(err: sqlx::Error) -> CoreError {
    CoreError::internal(err)
}
