use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use contracts::dashboards::d101_daily_insights::Insight;

use crate::dashboards::d101_daily_insights::InsightsService;

/// GET /api/insights
pub async fn get_insights(State(service): State<Arc<InsightsService>>) -> Json<Vec<Insight>> {
    let insights = service.generate_daily_insights().await;
    tracing::info!("D101 Insights: returning {} cards", insights.len());
    Json(insights)
}
