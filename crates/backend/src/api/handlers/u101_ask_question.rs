use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use contracts::usecases::u101_ask_question::{AskErrorResponse, AskRequest, AskResponse};

use crate::usecases::u101_ask_question::AskExecutor;

/// POST /api/ask
///
/// 400 only for a malformed body or a question outside 5..=500 characters;
/// every later failure is reported inside a 200 answer.
pub async fn ask(
    State(executor): State<Arc<AskExecutor>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, (StatusCode, Json<AskErrorResponse>)> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("U101: rejected ask body: {}", rejection.body_text());
        bad_request(rejection.body_text())
    })?;

    request.validate().map_err(bad_request)?;

    Ok(Json(executor.ask(&request).await))
}

fn bad_request(error: String) -> (StatusCode, Json<AskErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(AskErrorResponse { error }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u101_ask_question::context_cache::testing::{CountingLookup, FixedClock};
    use crate::usecases::u101_ask_question::query_executor::testing::RecordingRunner;
    use crate::usecases::u101_ask_question::{QueryExecutor, SchemaContextCache, SqlGenerator};
    use chrono::{Duration, Utc};

    fn executor() -> Arc<AskExecutor> {
        let cache = Arc::new(SchemaContextCache::new(
            Arc::new(CountingLookup::default()),
            Arc::new(FixedClock::at(Utc::now())),
            Duration::minutes(5),
        ));
        Arc::new(AskExecutor::new(
            Arc::new(SqlGenerator::new(cache, None, "sales_insights")),
            Arc::new(QueryExecutor::new(
                Arc::new(RecordingRunner::returning(vec![])),
                100,
            )),
        ))
    }

    fn body(question: &str) -> Result<Json<AskRequest>, JsonRejection> {
        Ok(Json(AskRequest {
            question: question.to_string(),
            include_sql: false,
        }))
    }

    #[tokio::test]
    async fn test_short_and_long_questions_are_bad_requests() {
        let too_long = "x".repeat(501);
        for question in ["", "abcd", too_long.as_str()] {
            let (status, Json(error)) = ask(State(executor()), body(question)).await.unwrap_err();
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(!error.error.is_empty());
        }
    }

    #[tokio::test]
    async fn test_valid_question_is_answered_with_200() {
        let Json(response) = ask(State(executor()), body("What was revenue last month?"))
            .await
            .unwrap();
        assert!(response.answer.starts_with("AI Q&A is not configured"));
        assert!(response.visualization.is_none());
    }
}
