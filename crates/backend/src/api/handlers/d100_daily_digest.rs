use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, FixedOffset, Local};

use crate::api::state::DigestCachePolicy;
use crate::dashboards::d100_daily_digest::DigestGenerator;

/// GET /api/digest
pub async fn get_digest(
    State(generator): State<Arc<DigestGenerator>>,
    State(cache): State<DigestCachePolicy>,
) -> Result<impl IntoResponse, StatusCode> {
    let now: DateTime<FixedOffset> = Local::now().into();

    match generator.generate(now).await {
        Ok(digest) => {
            tracing::info!("D100 Digest: returning {} sections", digest.sections.len());
            let cache_control = format!("public, max-age={}", cache.revalidate_secs);
            Ok(([(header::CACHE_CONTROL, cache_control)], Json(digest)))
        }
        Err(e) => {
            tracing::error!("D100 Digest: failed to generate digest: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
