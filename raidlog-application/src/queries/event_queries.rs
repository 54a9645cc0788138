use chrono::Utc;
use raidlog_domain::value_objects::{EventIndex, Vec3};
use raidlog_domain::{
    EventFilter, EventQueryParams, IndexedEvent, QueryReport, QueryRequest, RaidError,
};

use crate::state::{RememberedQuery, MAX_REMEMBERED_QUERIES};
use crate::{AppError, AppState};

pub async fn query_events(
    state: &AppState,
    params: EventQueryParams,
) -> Result<QueryReport, AppError> {
    let radius = params.radius.unwrap_or(state.config.search_radius);
    if radius.is_nan() || radius <= 0.0 {
        return Err(AppError::BadRequest("radius must be positive".to_string()));
    }
    let request = QueryRequest {
        position: Vec3::new(params.x, params.y, params.z),
        radius,
        filter: EventFilter::parse(params.filter.as_deref(), params.value.as_deref()),
    };
    if let Some(operator) = normalize_operator(params.operator) {
        remember(state, operator, request.clone()).await;
    }
    Ok(run(state, &request).await)
}

/// Re-runs the operator's last query against the current log.
pub async fn repeat_last_query(state: &AppState, operator: &str) -> Result<QueryReport, AppError> {
    let operator = normalize_operator(Some(operator.to_string()))
        .ok_or_else(|| AppError::BadRequest("operator must not be empty".to_string()))?;
    let request = state
        .last_queries
        .read()
        .await
        .get(&operator)
        .map(|remembered| remembered.request.clone())
        .ok_or_else(|| AppError::NotFound(format!("no previous query for '{}'", operator)))?;
    Ok(run(state, &request).await)
}

/// Reads one record by the index a query handed out; indices from before a deletion conflict.
pub async fn get_event(state: &AppState, index: EventIndex) -> Result<IndexedEvent, AppError> {
    let engine = state.engine.lock().await;
    match engine.store().query_by_index(index) {
        Ok(event) => Ok(IndexedEvent {
            index,
            event: event.clone(),
        }),
        Err(RaidError::StaleIndex { current, .. }) => Err(AppError::Conflict(format!(
            "event {} belongs to log generation {}, now {}; query again",
            index.position, index.generation, current
        ))),
        Err(RaidError::IndexNotFound { position, len }) => Err(AppError::NotFound(format!(
            "event {} (log holds {})",
            position, len
        ))),
        Err(err) => Err(AppError::Invariant(err)),
    }
}

async fn remember(state: &AppState, operator: String, request: QueryRequest) {
    let mut queries = state.last_queries.write().await;
    let sequence = queries
        .values()
        .map(|remembered| remembered.sequence + 1)
        .max()
        .unwrap_or(0);
    if !queries.contains_key(&operator) && queries.len() >= MAX_REMEMBERED_QUERIES {
        let oldest = queries
            .iter()
            .min_by_key(|(_, remembered)| remembered.sequence)
            .map(|(key, _)| key.clone());
        if let Some(oldest) = oldest {
            queries.remove(&oldest);
        }
    }
    queries.insert(operator, RememberedQuery { request, sequence });
}

async fn run(state: &AppState, request: &QueryRequest) -> QueryReport {
    let engine = state.engine.lock().await;
    engine.query(request, state.relations.as_ref(), Utc::now())
}

fn normalize_operator(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    })
}
