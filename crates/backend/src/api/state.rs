use std::sync::Arc;

use axum::extract::FromRef;

use crate::dashboards::d100_daily_digest::DigestGenerator;
use crate::dashboards::d101_daily_insights::InsightsService;
use crate::dashboards::d102_reports::ReportsService;
use crate::usecases::u101_ask_question::AskExecutor;

/// `Cache-Control` max-age for the digest response
#[derive(Debug, Clone, Copy)]
pub struct DigestCachePolicy {
    pub revalidate_secs: u64,
}

/// Services shared by every request. Handlers extract only the part they need.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub ask: Arc<AskExecutor>,
    pub digest: Arc<DigestGenerator>,
    pub digest_cache: DigestCachePolicy,
    pub insights: Arc<InsightsService>,
    pub reports: Arc<ReportsService>,
}
