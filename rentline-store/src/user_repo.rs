use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rentline_core::repository::UserRepository;
use rentline_core::user::{NewUser, User};
use rentline_core::{CoreError, CoreResult, UserId};
use rentline_shared::Masked;
use sqlx::PgPool;

use crate::database::{internal, violation, Violation};

pub struct StoreUserRepository {
    pool: PgPool,
}

impl StoreUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: String,
    date_joined: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = CoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: Masked::new(row.password_hash),
            role: row.role.parse().map_err(CoreError::internal)?,
            date_joined: row.date_joined,
        })
    }
}

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn create_user(&self, user: NewUser) -> CoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, role, date_joined
            "#,
        )
        .bind(&user.username)
        .bind(user.password_hash.expose())
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Some(Violation::Unique) => {
                CoreError::validation("username: A user with that username already exists.")
            }
            _ => internal(e),
        })?;

        row.try_into()
    }

    async fn find_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, date_joined FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?
        .map(User::try_from)
        .transpose()
    }

    async fn find_by_id(&self, id: UserId) -> CoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, date_joined FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?
        .map(User::try_from)
        .transpose()
    }
}
