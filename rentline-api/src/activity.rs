use axum::{extract::State, routing::get, Extension, Json, Router};
use rentline_core::activity::{SearchHistory, Visit};
use rentline_core::policy::{authorize, Action, Scope};

use crate::error::AppError;
use crate::middleware::Caller;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(list_history))
        .route("/visitors", get(list_visitors))
}

async fn list_history(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<SearchHistory>>, AppError> {
    let rows = match authorize(Action::ListSearchHistory, caller.role)? {
        Scope::Granted(_) => state.activity.list_search_history(caller.id).await?,
        Scope::Empty => Vec::new(),
    };

    Ok(Json(rows))
}

async fn list_visitors(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Visit>>, AppError> {
    let rows = match authorize(Action::ListVisitors, caller.role)? {
        Scope::Granted(_) => state.activity.list_visits_for_owner(caller.id).await?,
        Scope::Empty => Vec::new(),
    };

    Ok(Json(rows))
}
