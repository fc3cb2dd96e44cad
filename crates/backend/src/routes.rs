use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers;
use crate::api::AppState;

/// All application routes
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // UseCase u101: Ask a question
        .route("/api/ask", post(handlers::u101_ask_question::ask))
        // D100 Daily digest
        .route("/api/digest", get(handlers::d100_daily_digest::get_digest))
        // D101 Daily insights
        .route(
            "/api/insights",
            get(handlers::d101_daily_insights::get_insights),
        )
        // D102 Reports
        .route("/api/reports", get(handlers::d102_reports::list_reports))
        .route(
            "/api/reports/:slug",
            get(handlers::d102_reports::get_report),
        )
        .with_state(state)
}
