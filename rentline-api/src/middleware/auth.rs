use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rentline_core::{Role, UserId};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthClaims {
    pub sub: String,
    pub role: Role,
    pub token_type: TokenType,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl AuthClaims {
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::AuthenticationError("Token contained no recognizable user identification".to_string()))
    }
}

/// Authenticated principal placed in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

/// Set by [`optional_auth`]; `None` for anonymous requests.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<Caller>);

pub fn decode_token(
    auth: &AuthConfig,
    token: &str,
    expected: TokenType,
) -> Result<AuthClaims, AppError> {
    let token_data = decode::<AuthClaims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected token");
        AppError::AuthenticationError("Given token not valid for any token type".to_string())
    })?;

    if token_data.claims.token_type != expected {
        return Err(AppError::AuthenticationError(
            "Given token not valid for any token type".to_string(),
        ));
    }

    Ok(token_data.claims)
}

/// `Ok(None)` when no Authorization header is present at all.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(Some)
        .ok_or_else(|| AppError::AuthenticationError("Invalid Authorization header.".to_string()))
}

fn caller_from(state: &AppState, token: &str) -> Result<Caller, AppError> {
    let claims = decode_token(&state.auth, token, TokenType::Access)?;
    Ok(Caller {
        id: claims.user_id()?,
        role: claims.role,
    })
}

// ============================================================================
// Authentication Middleware
// ============================================================================

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?.ok_or_else(|| {
        AppError::AuthenticationError("Authentication credentials were not provided.".to_string())
    })?;
    let caller = caller_from(&state, token)?;

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

/// Public routes: no header means anonymous, a bad token is still a 401.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = match bearer_token(req.headers())? {
        Some(token) => Some(caller_from(&state, token)?),
        None => None,
    };

    req.extensions_mut().insert(Viewer(caller));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_absent_header_is_anonymous() {
        assert!(bearer_token(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            bearer_token(&headers),
            Err(AppError::AuthenticationError(_))
        ));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), Some("abc.def"));
    }
}
