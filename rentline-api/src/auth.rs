use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rentline_core::user::{NewUser, RegisterUser, User, UserProfile};
use rentline_core::{Role, UserId};
use rentline_shared::Masked;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::auth::{decode_token, AuthClaims, TokenType};
use crate::state::{AppState, AuthConfig};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: Masked<String>,
}

#[derive(Debug, Serialize)]
struct TokenPair {
    refresh: String,
    access: String,
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh: String,
}

#[derive(Debug, Serialize)]
struct AccessToken {
    access: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
        .route("/user/token/refresh", post(refresh))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterUser>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    req.validate()?;

    let password_hash = hash_password(&state.auth, req.password).await?;
    let user = state
        .users
        .create_user(NewUser {
            username: req.username,
            password_hash,
            role: req.role,
        })
        .await?;

    info!(user_id = user.id, role = %user.role, "user registered");

    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let invalid = || AppError::AuthenticationError(INVALID_CREDENTIALS.to_string());

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&user, req.password).await? {
        return Err(invalid());
    }

    info!(user_id = user.id, "user logged in");

    Ok(Json(TokenPair {
        refresh: issue_token(&state.auth, user.id, user.role, TokenType::Refresh)?,
        access: issue_token(&state.auth, user.id, user.role, TokenType::Access)?,
    }))
}

async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<Json<AccessToken>, AppError> {
    let claims = decode_token(&state.auth, &req.refresh, TokenType::Refresh)?;
    let user_id = claims.user_id()?;

    // Role comes from the stored account, not from the refresh claims.
    let user = state.users.find_by_id(user_id).await?.ok_or_else(|| {
        AppError::AuthenticationError("User not found".to_string())
    })?;

    Ok(Json(AccessToken {
        access: issue_token(&state.auth, user.id, user.role, TokenType::Access)?,
    }))
}

pub fn issue_token(
    auth: &AuthConfig,
    user_id: UserId,
    role: Role,
    token_type: TokenType,
) -> Result<String, AppError> {
    let ttl = match token_type {
        TokenType::Access => auth.access_token_seconds,
        TokenType::Refresh => auth.refresh_token_seconds,
    };
    let now = Utc::now();
    let claims = AuthClaims {
        sub: user_id.to_string(),
        role,
        token_type,
        jti: Uuid::new_v4().simple().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl as i64)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

fn hasher(auth: &AuthConfig) -> Result<Argon2<'static>, AppError> {
    let params = Params::new(auth.hash_memory_kib, auth.hash_iterations, 1, None)
        .map_err(|e| AppError::InternalServerError(format!("Invalid Argon2 parameters: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

async fn hash_password(
    auth: &AuthConfig,
    password: Masked<String>,
) -> Result<Masked<String>, AppError> {
    let argon2 = hasher(auth)?;

    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        argon2
            .hash_password(password.expose().as_bytes(), &salt)
            .map(|hash| Masked::new(hash.to_string()))
            .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))
    })
    .await?
}

/// Cost parameters come from the stored PHC string, not from config.
async fn verify_password(user: &User, password: Masked<String>) -> Result<bool, AppError> {
    let stored = user.password_hash.clone();

    tokio::task::spawn_blocking(move || -> Result<bool, AppError> {
        let parsed = PasswordHash::new(stored.expose()).map_err(|e| {
            AppError::InternalServerError(format!("Stored password hash is unreadable: {}", e))
        })?;
        Ok(Argon2::default()
            .verify_password(password.expose().as_bytes(), &parsed)
            .is_ok())
    })
    .await?
}
