use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use rentline_core::activity::encode_query;
use rentline_core::estate::{Estate, EstateFilter, EstateInput, EstatePatch};
use rentline_core::pagination::{Page, PageRequest};
use rentline_core::policy::{authorize, ensure_owner, Action};
use rentline_core::EstateId;
use tracing::{info, warn};

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{Caller, Viewer};
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFoundError("No Estate matches the given query.".to_string())
}

/// Listing and detail; reachable anonymously.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/estate", get(list_estates))
        .route("/estate/{id}", get(get_estate))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/estate/create", post(create_estate))
        .route("/estate/{id}/update", patch(patch_estate).put(replace_estate))
        .route("/estate/{id}/delete", delete(delete_estate))
}

async fn list_estates(
    State(state): State<AppState>,
    Extension(Viewer(viewer)): Extension<Viewer>,
    ApiQuery(params): ApiQuery<BTreeMap<String, String>>,
) -> Result<Json<Page<Estate>>, AppError> {
    if let Some(caller) = viewer {
        state
            .activity
            .record_search(caller.id, &encode_query(&params))
            .await?;
    }

    let filter = EstateFilter::from_query(&params)?;
    let request = PageRequest::from_query(&params, state.default_page_size)?;
    let (count, results) = state.estates.list_active(&filter, request).await?;

    Ok(Json(Page::new(request, count, results)?))
}

async fn get_estate(
    State(state): State<AppState>,
    Extension(Viewer(viewer)): Extension<Viewer>,
    ApiPath(id): ApiPath<EstateId>,
) -> Result<Json<Estate>, AppError> {
    let estate = state.estates.get_estate(id).await?.ok_or_else(not_found)?;

    if let Some(caller) = viewer {
        // A lost visit row must not fail the read.
        if let Err(e) = state.activity.record_visit(estate.id, caller.id).await {
            warn!(estate_id = estate.id, error = %e, "failed to record visit");
        }
    }

    Ok(Json(estate))
}

async fn create_estate(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(input): ApiJson<EstateInput>,
) -> Result<(StatusCode, Json<Estate>), AppError> {
    authorize(Action::CreateEstate, caller.role)?;
    input.validate()?;

    let estate = state.estates.create_estate(input.into_new(caller.id)).await?;
    info!(estate_id = estate.id, owner = caller.id, "estate created");

    Ok((StatusCode::CREATED, Json(estate)))
}

async fn patch_estate(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<EstateId>,
    ApiJson(patch): ApiJson<EstatePatch>,
) -> Result<Json<Estate>, AppError> {
    apply_update(&state, caller, id, patch).await
}

async fn replace_estate(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<EstateId>,
    ApiJson(input): ApiJson<EstateInput>,
) -> Result<Json<Estate>, AppError> {
    apply_update(&state, caller, id, input.into()).await
}

async fn apply_update(
    state: &AppState,
    caller: Caller,
    id: EstateId,
    patch: EstatePatch,
) -> Result<Json<Estate>, AppError> {
    authorize(Action::UpdateEstate, caller.role)?;
    let owner = state.estates.owner_of(id).await?.ok_or_else(not_found)?;
    ensure_owner(Action::UpdateEstate, owner, caller.id)?;
    patch.validate()?;

    let estate = state
        .estates
        .update_estate(id, &patch)
        .await?
        .ok_or_else(not_found)?;
    info!(estate_id = id, "estate updated");

    Ok(Json(estate))
}

async fn delete_estate(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<EstateId>,
) -> Result<StatusCode, AppError> {
    authorize(Action::DeleteEstate, caller.role)?;
    let owner = state.estates.owner_of(id).await?.ok_or_else(not_found)?;
    ensure_owner(Action::DeleteEstate, owner, caller.id)?;

    if !state.estates.delete_estate(id).await? {
        return Err(not_found());
    }
    info!(estate_id = id, "estate deleted");

    Ok(StatusCode::NO_CONTENT)
}
