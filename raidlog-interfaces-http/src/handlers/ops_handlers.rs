use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tokio::time::{timeout, Duration};
use tracing::error;

use raidlog_application::AppState;
use raidlog_domain::{DeliveryListQuery, DeliveryRecord};

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(Serialize)]
struct ReadyStatus {
    status: String,
    log_size: usize,
    in_flight: usize,
    pending_deliveries: usize,
}

pub async fn list_deliveries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DeliveryListQuery>,
) -> Result<Json<Vec<DeliveryRecord>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let deliveries = state.delivery.list_deliveries(limit).await;
    Ok(Json(deliveries))
}

pub async fn get_last_delivery(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<DeliveryRecord>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let last = state.delivery.last_delivery().await;
    Ok(Json(last))
}

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let timeout_secs = state.config.request_timeout_seconds.max(1);
    let timeout_duration = Duration::from_secs(timeout_secs);
    let (status, label) = match timeout(timeout_duration, state.event_repo.ping()).await {
        Ok(Ok(_)) => (StatusCode::OK, "ok"),
        Ok(Err(err)) => {
            error!("ready check failed: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, "error")
        }
        Err(_) => {
            error!("ready check timeout after {}s", timeout_secs);
            (StatusCode::SERVICE_UNAVAILABLE, "timeout")
        }
    };
    let (log_size, in_flight) = {
        let engine = state.engine.lock().await;
        (engine.store().len(), engine.tracker().active())
    };
    (
        status,
        Json(ReadyStatus {
            status: label.to_string(),
            log_size,
            in_flight,
            pending_deliveries: state.delivery.pending(),
        }),
    )
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized".to_string()).into_response();
    }
    let (log_size, in_flight) = {
        let engine = state.engine.lock().await;
        (engine.store().len(), engine.tracker().active())
    };
    let payload = state
        .metrics
        .render_prometheus(log_size, in_flight, state.delivery.pending());
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    (headers, payload).into_response()
}
