// Presentation layer - HTTP routes over the design service
pub mod app_state;
pub mod handlers;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{health_check, list_charts, run_design};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/charts", get(list_charts))
        .route("/design", post(run_design))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
