use axum::routing::{get, post};
use axum::Router;

use raidlog_application::AppState;

use crate::handlers::{
    event_handlers, ingest_handlers, ops_handlers, query_handlers, stream_handlers,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/host/signals", post(ingest_handlers::ingest_signals))
        .route("/v1/events", get(event_handlers::query_events))
        .route("/v1/events/last", get(event_handlers::repeat_last_query))
        .route("/v1/events/:index", get(event_handlers::get_event))
        .route(
            "/v1/events/delete/radius",
            post(event_handlers::delete_by_radius),
        )
        .route(
            "/v1/events/delete/attacker",
            post(event_handlers::delete_by_attacker),
        )
        .route(
            "/v1/events/delete/range",
            post(event_handlers::delete_by_range),
        )
        .route("/v1/events/delete/all", post(event_handlers::wipe_all))
        .route("/v1/policies", get(query_handlers::list_policies))
        .route(
            "/v1/catalog",
            get(query_handlers::list_catalog).put(query_handlers::update_catalog),
        )
        .route(
            "/v1/stream/broadcast",
            get(stream_handlers::broadcast_stream),
        )
        .route("/v1/ops/deliveries", get(ops_handlers::list_deliveries))
        .route(
            "/v1/ops/deliveries/last",
            get(ops_handlers::get_last_delivery),
        )
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
