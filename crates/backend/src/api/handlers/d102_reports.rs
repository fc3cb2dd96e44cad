use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::dashboards::d102_reports::{ReportData, ReportSummary};

use crate::dashboards::d102_reports::ReportsService;

/// GET /api/reports
pub async fn list_reports(State(service): State<Arc<ReportsService>>) -> Json<Vec<ReportSummary>> {
    Json(service.list_reports())
}

/// GET /api/reports/:slug
pub async fn get_report(
    State(service): State<Arc<ReportsService>>,
    Path(slug): Path<String>,
) -> Result<Json<ReportData>, StatusCode> {
    match service.run_report(&slug).await {
        Some(report) => Ok(Json(report)),
        None => {
            tracing::warn!("D102 Reports: unknown report '{}'", slug);
            Err(StatusCode::NOT_FOUND)
        }
    }
}
