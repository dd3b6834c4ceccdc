//! HTTP handlers for API endpoints.

use crate::error::{MonitorError, Result};
use crate::metrics::{aggregate, AggregateSnapshot, ResultSet, Snapshot};
use crate::web::AppState;
use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::task;
use tracing::debug;

/// Query string of `/concurrent-metrics`.
///
/// Kept as raw text so that a malformed value falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ConcurrencyParams {
    pub concurrency: Option<String>,
}

/// Response body of `/concurrent-metrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrentMetricsResponse {
    pub average_metrics: AggregateSnapshot,
    pub total_results: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// `None` when no sample succeeded; the zero aggregate has no score.
    pub performance_score: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl ConcurrentMetricsResponse {
    /// Aggregate `results` into a response envelope.
    pub fn from_results(results: &ResultSet) -> Self {
        let average_metrics = aggregate(results);
        let success_count = results.success_count();
        let performance_score = (success_count > 0).then(|| average_metrics.performance_score());

        Self {
            average_metrics,
            total_results: results.len(),
            success_count,
            error_count: results.error_count(),
            performance_score,
            timestamp: Utc::now(),
        }
    }
}

/// Take one snapshot directly from the sampler.
pub async fn get_metrics(State(state): State<AppState>) -> Result<Json<Snapshot>> {
    let sampler = Arc::clone(&state.sampler);
    let snapshot = task::spawn_blocking(move || sampler.sample())
        .await
        .map_err(|e| MonitorError::collection_error(format!("Sampler failed: {}", e)))?;

    Ok(Json(snapshot))
}

/// Run one concurrent collection and return its average.
pub async fn get_concurrent_metrics(
    State(state): State<AppState>,
    Query(params): Query<ConcurrencyParams>,
) -> Result<Json<ConcurrentMetricsResponse>> {
    let concurrency = state
        .config
        .resolve_concurrency(params.concurrency.as_deref());
    debug!(requested = ?params.concurrency, concurrency, "Concurrent metrics request");

    let results = state.collector.collect(concurrency).await?;

    Ok(Json(ConcurrentMetricsResponse::from_results(&results)))
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "concurrent-monitor",
        "sampler": state.sampler.name(),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339()
    }))
}
