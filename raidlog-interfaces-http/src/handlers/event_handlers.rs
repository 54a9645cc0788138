use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use raidlog_application::commands::store_commands;
use raidlog_application::queries::event_queries;
use raidlog_application::AppState;
use raidlog_domain::{
    AttackerDeletion, DeletionReport, EventIndex, EventLookupParams, EventQueryParams,
    IndexedEvent, LastQueryParams, QueryReport, RadiusDeletion, RangeDeletion,
};

use crate::error::HttpError;
use crate::middleware::{authorize, authorize_admin};

#[derive(Debug, Deserialize)]
pub struct WipeRequest {
    #[serde(default)]
    pub operator_name: String,
}

pub async fn query_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<EventQueryParams>,
) -> Result<Json<QueryReport>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let report = event_queries::query_events(&state, params).await?;
    Ok(Json(report))
}

pub async fn repeat_last_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<LastQueryParams>,
) -> Result<Json<QueryReport>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let report = event_queries::repeat_last_query(&state, &params.operator).await?;
    Ok(Json(report))
}

pub async fn get_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(position): Path<usize>,
    Query(lookup): Query<EventLookupParams>,
) -> Result<Json<IndexedEvent>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let index = EventIndex {
        position,
        generation: lookup.generation,
    };
    let event = event_queries::get_event(&state, index).await?;
    Ok(Json(event))
}

pub async fn delete_by_radius(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RadiusDeletion>,
) -> Result<Json<DeletionReport>, HttpError> {
    authorize_admin(&state.config, &headers)?;
    let report = store_commands::delete_by_radius(&state, request).await?;
    Ok(Json(report))
}

pub async fn delete_by_attacker(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AttackerDeletion>,
) -> Result<Json<DeletionReport>, HttpError> {
    authorize_admin(&state.config, &headers)?;
    let report = store_commands::delete_by_attacker(&state, request).await?;
    Ok(Json(report))
}

pub async fn delete_by_range(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RangeDeletion>,
) -> Result<Json<DeletionReport>, HttpError> {
    authorize_admin(&state.config, &headers)?;
    let report = store_commands::delete_by_range(&state, request).await?;
    Ok(Json(report))
}

pub async fn wipe_all(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<WipeRequest>,
) -> Result<Json<DeletionReport>, HttpError> {
    authorize_admin(&state.config, &headers)?;
    let report = store_commands::wipe_all(&state, &request.operator_name).await?;
    Ok(Json(report))
}
