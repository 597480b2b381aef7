//! Shared application state for request handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::health::StatusSource;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds the status source every probe request queries and the bound on how
/// long a single query may take.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn StatusSource>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Creates a new application state around the given status source.
    pub fn new(source: Arc<dyn StatusSource>, request_timeout: Duration) -> Self {
        Self {
            source,
            request_timeout,
        }
    }
}
