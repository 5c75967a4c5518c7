// HTTP request handlers
use crate::application::polling::{FetchStatus, PollParameters};
use crate::domain::chart::{LatestReadout, PlotBundle};
use crate::domain::dashboard::{RangeOption, range_options};
use crate::domain::range::TimeRange;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything a client needs to render one frame of the dashboard.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub parameters: PollParameters,
    pub status: FetchStatus,
    pub readout: LatestReadout,
    pub chart: PlotBundle,
    pub ranges: Vec<RangeOption>,
}

#[derive(Debug, Deserialize)]
pub struct ParametersRequest {
    pub range: String,
    /// Keeps the current live setting when omitted.
    pub live: Option<bool>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(dashboard_view(&state))
}

/// Switch range or live mode, then answer with the refreshed view.
pub async fn update_parameters(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ParametersRequest>,
) -> Result<Json<DashboardView>, ApiError> {
    let range: TimeRange = request.range.parse().map_err(|e| ApiError {
        status: StatusCode::BAD_REQUEST,
        message: format!("{}", e),
    })?;
    let live = request
        .live
        .unwrap_or_else(|| state.controller.parameters().live);

    state.controller.update_parameters(range, live);
    Ok(Json(dashboard_view(&state)))
}

fn dashboard_view(state: &AppState) -> DashboardView {
    let status = state.controller.status();
    let store = state.controller.store();
    let latest = store.latest();
    let series = store.series();

    let chart = match &series {
        Some(series) => state
            .projector
            .project(series.points(), &state.colors, series.range()),
        None => state
            .projector
            .project(&[], &state.colors, status.parameters.range),
    };

    DashboardView {
        parameters: status.parameters,
        readout: state.projector.readout(latest.as_deref()),
        chart,
        ranges: range_options(status.parameters.range),
        status,
    }
}
