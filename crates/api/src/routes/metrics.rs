//! Prometheus Exposition

use axum::extract::State;

use crate::error::ApiError;
use crate::SharedState;

/// Render recorded metrics in Prometheus text format
pub async fn get_metrics(State(state): State<SharedState>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or(ApiError::MetricsUnavailable)
}
