pub mod activity;
pub mod booking;
pub mod estate;
pub mod pagination;
pub mod policy;
pub mod repository;
pub mod review;
pub mod role;
pub mod user;

pub use role::Role;

pub type UserId = i64;
pub type EstateId = i64;
pub type BookingId = i64;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::InternalError(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
