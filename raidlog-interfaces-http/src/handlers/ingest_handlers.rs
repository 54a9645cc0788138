use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::{debug, error};

use raidlog_application::commands::ingest_commands;
use raidlog_application::AppState;
use raidlog_domain::IngestSummary;

use crate::error::HttpError;
use crate::middleware::{authorize, parse_signals};

pub async fn ingest_signals(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<IngestSummary>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }

    let (server_id, signals) = parse_signals(&headers, &body).map_err(|err| {
        error!("failed to parse host signals: {}", err);
        state.metrics.record_ingest_error();
        HttpError::BadRequest(err.to_string())
    })?;
    debug!(
        server = server_id.as_deref().unwrap_or("-"),
        signals = signals.len(),
        "host signal batch"
    );

    let summary = ingest_commands::process_host_signals(&state, signals).await?;
    Ok(Json(summary))
}
