//! Swarm membership probe endpoint.
//!
//! Each request takes a fresh status snapshot from the daemon and answers:
//! 204 when the node is an active swarm member, 503 when it is not, and an
//! empty 500 when the daemon could not be asked.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::config::NOT_READY_MESSAGE;
use crate::health::check_node;
use crate::state::AppState;

/// Probe handler for `GET /ishealthy`.
pub async fn is_healthy(State(state): State<AppState>) -> Response {
    match check_node(state.source.as_ref(), state.request_timeout).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::SERVICE_UNAVAILABLE, NOT_READY_MESSAGE).into_response(),
        Err(e) => e.into_response(),
    }
}
