use std::sync::Arc;
use std::time::Instant;

use contracts::usecases::u101_ask_question::{AskRequest, AskResponse, Visualization};

use super::answer_formatter::format_answer;
use super::errors::AskError;
use super::query_executor::QueryExecutor;
use super::sql_generator::SqlGenerator;

/// Question -> SQL -> rows -> answer, strictly sequential.
///
/// `ask` never fails: every [`AskError`] becomes an answer sentence.
pub struct AskExecutor {
    generator: Arc<SqlGenerator>,
    query_executor: Arc<QueryExecutor>,
}

impl AskExecutor {
    pub fn new(generator: Arc<SqlGenerator>, query_executor: Arc<QueryExecutor>) -> Self {
        Self {
            generator,
            query_executor,
        }
    }

    pub async fn ask(&self, request: &AskRequest) -> AskResponse {
        tracing::info!("Ask: {}", request.question);

        let generated = match self.generator.generate(&request.question).await {
            Ok(generated) => generated,
            Err(e) => {
                log_failure(&e);
                return AskResponse::message(e.user_message(), None);
            }
        };

        let echoed_sql = request.include_sql.then(|| generated.sql.clone());

        let started = Instant::now();
        let rows = match self.query_executor.execute(&generated.sql).await {
            Ok(rows) => rows,
            Err(e) => {
                log_failure(&e);
                return AskResponse::message(e.user_message(), echoed_sql);
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let answer = format_answer(&generated.explanation, &rows, generated.visualization_type);
        tracing::info!("Ask answered with {} rows in {}ms", rows.len(), elapsed_ms);

        let visualization = (!rows.is_empty()).then(|| Visualization {
            kind: generated.visualization_type,
            data: rows,
        });

        AskResponse {
            answer,
            visualization,
            sql: echoed_sql,
            execution_time_ms: Some(elapsed_ms),
        }
    }
}

fn log_failure(e: &AskError) {
    match e {
        AskError::Configuration => tracing::warn!("Ask skipped: {}", e),
        _ => tracing::error!("Ask API error: {}", e),
    }
}
