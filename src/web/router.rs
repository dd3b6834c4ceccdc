//! Web application router and middleware setup.

use crate::web::{handlers, AppState};
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the axum application with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let enable_cors = state.config.enable_cors;

    let mut app = Router::new()
        .route("/metrics", get(handlers::get_metrics))
        .route("/concurrent-metrics", get(handlers::get_concurrent_metrics))
        .route("/health", get(handlers::health_check))
        .with_state(state);

    if enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
