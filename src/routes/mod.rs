//! HTTP routes for the probe.
//!
//! Only the probe route is served; every other path gets axum's default 404.
//! Responses carry `Cache-Control: no-store` so intermediaries never answer a
//! probe from cache, and every request runs inside a request-ID span.

pub mod health;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::{CACHE_CONTROL_PROBE, HEALTH_PATH};
use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Creates the Axum router with the probe route.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health::is_healthy))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_PROBE),
        ))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
