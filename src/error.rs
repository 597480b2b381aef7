use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;

/// Failure to obtain a cluster status snapshot from the daemon.
///
/// None of these reach the probe caller in detail: every variant becomes an
/// empty 500 and the cause is only logged.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Docker daemon unavailable: {0}")]
    DaemonUnavailable(String),

    #[error("Failed to fetch swarm status: {0}")]
    StatusFetchFailed(String),

    #[error("Swarm status request timed out after {0:?}")]
    Timeout(Duration),
}

/// The daemon answering with an error status is a fetch failure; anything
/// failing below that (socket, transport, timeout) means it is unreachable.
impl From<bollard::errors::Error> for ProbeError {
    fn from(err: bollard::errors::Error) -> Self {
        match err {
            bollard::errors::Error::DockerResponseServerError { .. } => {
                ProbeError::StatusFetchFailed(err.to_string())
            }
            _ => ProbeError::DaemonUnavailable(err.to_string()),
        }
    }
}

impl IntoResponse for ProbeError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Health check failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
