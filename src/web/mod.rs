//! Web server and API endpoints.
//!
//! Serves raw snapshots at `/metrics` and concurrent averages at
//! `/concurrent-metrics`. Every request owns its own result set; handlers
//! share only read-only state.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;

use crate::error::{MonitorError, Result};
use crate::metrics::{Collector, CollectorConfig, Sampler};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub sampler: Arc<dyn Sampler>,
    pub collector: Collector,
    pub config: Arc<WebConfig>,
}

impl AppState {
    /// Build handler state around `sampler`, using the default failure policy.
    pub fn new(sampler: Arc<dyn Sampler>, config: WebConfig) -> Self {
        let collector_config = CollectorConfig::default().with_max_concurrency(config.max_concurrency);
        Self::with_collector_config(sampler, config, collector_config)
    }

    /// Both maxima are raised to at least 1, since requests are always
    /// clamped to a concurrency of at least 1.
    pub fn with_collector_config(
        sampler: Arc<dyn Sampler>,
        mut config: WebConfig,
        mut collector_config: CollectorConfig,
    ) -> Self {
        config.max_concurrency = config.max_concurrency.max(1);
        collector_config.max_concurrency = collector_config.max_concurrency.max(1);

        Self {
            collector: Collector::with_config(Arc::clone(&sampler), collector_config),
            sampler,
            config: Arc::new(config),
        }
    }
}

/// Start the web server and serve until it fails.
pub async fn start_web_server(state: AppState) -> Result<()> {
    let addr = state
        .config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| MonitorError::config_error(format!("Invalid bind address: {}", e)))?;

    let app = create_app(state);

    info!("Starting concurrent monitor on http://{}", addr);
    info!("Snapshot endpoint: http://{}/metrics", addr);
    info!("Aggregate endpoint: http://{}/concurrent-metrics", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MonitorError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| MonitorError::web_server_error(format!("Server error: {}", e)))?;

    Ok(())
}
