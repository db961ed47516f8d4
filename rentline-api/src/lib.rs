use axum::{http::Method, middleware::from_fn_with_state, Router};
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

pub mod activity;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod estates;
pub mod extract;
pub mod middleware;
pub mod reviews;
pub mod state;

pub use state::AppState;

use crate::error::AppError;
use crate::middleware::{optional_auth, require_auth};

pub fn router(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let public = estates::public_routes()
        .route_layer(from_fn_with_state(state.clone(), optional_auth));

    let protected = Router::new()
        .merge(estates::protected_routes())
        .merge(bookings::routes())
        .merge(reviews::routes())
        .merge(activity::routes())
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(auth::routes())
        .merge(public)
        .merge(protected)
        .fallback(|| async { AppError::NotFoundError("Not found.".to_string()) })
        .method_not_allowed_fallback(|| async {
            AppError::MethodNotAllowed("Method not allowed.".to_string())
        })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The router with trailing slashes trimmed before routing, so `/estate/`
/// and `/estate` reach the same handler.
pub fn app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}
