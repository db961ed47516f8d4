use chrono::{DateTime, Utc};
use rentline_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, Role, UserId};

pub const USERNAME_MAX_LEN: usize = 150;

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: Masked<String>,
    pub role: Role,
    pub date_joined: DateTime<Utc>,
}

/// Public view of an account; the hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub password: Masked<String>,
    pub role: Role,
}

impl RegisterUser {
    pub fn validate(&self) -> CoreResult<()> {
        validate_username(&self.username)?;
        if self.password.expose().is_empty() {
            return Err(CoreError::validation("password: This field may not be blank."));
        }
        Ok(())
    }
}

/// Row to insert once the password has been hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: Masked<String>,
    pub role: Role,
}

pub fn validate_username(username: &str) -> CoreResult<()> {
    if username.is_empty() {
        return Err(CoreError::validation("username: This field may not be blank."));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(CoreError::validation(format!(
            "username: Ensure this field has no more than {} characters.",
            USERNAME_MAX_LEN
        )));
    }
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !valid {
        return Err(CoreError::validation(
            "username: Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}
