// HTTP request handlers
use crate::domain::chart::ChartSummary;
use crate::domain::design::{DesignInputs, DesignReport};
use crate::domain::error::DesignError;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

/// A design request the engine refused
#[derive(Debug)]
pub struct ApiError(DesignError);

impl From<DesignError> for ApiError {
    fn from(err: DesignError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!("Rejected design request: {}", self.0);
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Families, φe values and sizes of the loaded charts
pub async fn list_charts(State(state): State<Arc<AppState>>) -> Json<Vec<ChartSummary>> {
    Json(state.design_service.chart_summary())
}

/// Run one design session
pub async fn run_design(
    State(state): State<Arc<AppState>>,
    Json(inputs): Json<DesignInputs>,
) -> Result<Json<DesignReport>, ApiError> {
    let report = state.design_service.design(&inputs)?;
    Ok(Json(report))
}
