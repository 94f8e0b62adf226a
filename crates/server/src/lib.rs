pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use std::time::Duration;

use axum::{Router, http::StatusCode, routing::get};
use metaprobe_core::{MetaprobeError, Scraper};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;
use crate::state::AppState;

/// Build the router with every route and layer wired.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metadata", get(handlers::metadata))
        .layer(TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, request_timeout))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the application from a loaded config.
pub fn app(config: &Config) -> Result<Router, MetaprobeError> {
    let scraper = Scraper::with_config(config.scraper_config())?;
    Ok(router(AppState::new(scraper), config.request_timeout()))
}
