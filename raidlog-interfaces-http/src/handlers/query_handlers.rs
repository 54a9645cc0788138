use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use raidlog_application::commands::catalog_commands;
use raidlog_application::queries::{catalog_queries, policy_queries};
use raidlog_application::AppState;
use raidlog_domain::{
    CatalogEntry, CatalogPayload, CatalogQuery, CatalogUpdateQuery, PolicyListQuery,
    PolicyListing,
};

use crate::error::HttpError;
use crate::middleware::{authorize, authorize_admin};

#[derive(Serialize)]
pub struct CatalogUpdateResult {
    pub entries: usize,
}

pub async fn list_policies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PolicyListQuery>,
) -> Result<Json<Vec<PolicyListing>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let listings = policy_queries::list_policies(&state, query).await?;
    Ok(Json(listings))
}

pub async fn list_catalog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<CatalogEntry>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let results = catalog_queries::list_catalog(&state, query).await?;
    Ok(Json(results))
}

pub async fn update_catalog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CatalogUpdateQuery>,
    Json(payload): Json<CatalogPayload>,
) -> Result<Json<CatalogUpdateResult>, HttpError> {
    authorize_admin(&state.config, &headers)?;
    let entries = catalog_commands::update_catalog(&state, query, payload).await?;
    Ok(Json(CatalogUpdateResult { entries }))
}
