use std::sync::Arc;

use contracts::usecases::u101_ask_question::VisualizationType;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::context_cache::SchemaContextCache;
use super::errors::AskError;
use super::prompt_builder::build_prompt;
use crate::shared::llm::{ChatMessage, CompletionOptions, LlmError, LlmProvider};

/// Keywords that mark a statement as data-mutating. Lexical only: a keyword inside
/// a string literal or identifier also matches.
static DENYLIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(INSERT|UPDATE|DELETE|DROP|ALTER|TRUNCATE|CREATE)\b")
        .expect("denylist pattern is valid")
});

/// Validated model output
#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub sql: String,
    pub explanation: String,
    pub visualization_type: VisualizationType,
}

#[derive(Debug, Deserialize)]
struct ModelReply {
    sql: Option<String>,
    explanation: Option<String>,
    visualization_type: Option<String>,
}

/// Turns a question into a single checked SELECT statement
pub struct SqlGenerator {
    cache: Arc<SchemaContextCache>,
    provider: Option<Arc<dyn LlmProvider>>,
    schema: String,
}

impl SqlGenerator {
    pub fn new(
        cache: Arc<SchemaContextCache>,
        provider: Option<Arc<dyn LlmProvider>>,
        schema: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            provider,
            schema: schema.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn generate(&self, question: &str) -> Result<SqlResult, AskError> {
        let provider = self.provider.as_ref().ok_or(AskError::Configuration)?;

        let context = self
            .cache
            .get()
            .await
            .map_err(|e| AskError::ContextUnavailable(e.to_string()))?;
        let prompt = build_prompt(&context, &self.schema);

        let messages = vec![ChatMessage::system(prompt), ChatMessage::user(question)];
        let response = provider
            .chat_completion(messages, &CompletionOptions::json_deterministic())
            .await
            .map_err(|e| match e {
                LlmError::EmptyResponse => AskError::Parse("No response from model".to_string()),
                other => AskError::Llm(other),
            })?;

        let result = parse_reply(&response.content)?;
        check_sql(&result.sql, &self.schema)?;

        tracing::info!(
            "Generated SQL ({}, {} tokens): {}",
            result.visualization_type,
            response.tokens_used.unwrap_or(0),
            result.sql
        );
        Ok(result)
    }
}

/// Read the JSON object the model replied with
pub fn parse_reply(content: &str) -> Result<SqlResult, AskError> {
    if content.trim().is_empty() {
        return Err(AskError::Parse("No response from model".to_string()));
    }

    let reply: ModelReply =
        serde_json::from_str(content).map_err(|e| AskError::Parse(e.to_string()))?;
    let sql = reply
        .sql
        .map(|s| s.trim().to_string())
        .ok_or_else(|| AskError::Parse("reply has no sql field".to_string()))?;

    Ok(SqlResult {
        sql,
        explanation: reply.explanation.unwrap_or_default(),
        visualization_type: reply
            .visualization_type
            .as_deref()
            .and_then(VisualizationType::parse)
            .unwrap_or_default(),
    })
}

/// Denylist first, then the schema qualification
pub fn check_sql(sql: &str, schema: &str) -> Result<(), AskError> {
    if let Some(m) = DENYLIST.find(sql) {
        tracing::warn!("Rejected generated SQL with keyword {}: {}", m.as_str(), sql);
        return Err(AskError::UnsafeQuery {
            keyword: m.as_str().to_uppercase(),
        });
    }

    let prefix = format!("{}.", schema.to_lowercase());
    if !sql.to_lowercase().contains(&prefix) {
        tracing::warn!("Rejected generated SQL without {} prefix: {}", prefix, sql);
        return Err(AskError::SchemaViolation {
            schema: schema.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::llm::testing::ScriptedProvider;
    use crate::usecases::u101_ask_question::context_cache::testing::{CountingLookup, FixedClock};
    use chrono::{Duration, Utc};

    fn cache() -> Arc<SchemaContextCache> {
        Arc::new(SchemaContextCache::new(
            Arc::new(CountingLookup::default()),
            Arc::new(FixedClock::at(Utc::now())),
            Duration::minutes(5),
        ))
    }

    fn generator(provider: Option<Arc<dyn LlmProvider>>) -> SqlGenerator {
        SqlGenerator::new(cache(), provider, "sales_insights")
    }

    #[tokio::test]
    async fn test_generate_valid_reply() {
        let provider = Arc::new(ScriptedProvider::replying(
            r#"{"sql": " SELECT SUM(revenue_amount) FROM sales_insights.sales_orders; ", "explanation": "Total revenue", "visualization_type": "scalar"}"#,
        ));
        let result = generator(Some(provider.clone())).generate("total revenue?").await.unwrap();

        assert_eq!(result.sql, "SELECT SUM(revenue_amount) FROM sales_insights.sales_orders;");
        assert_eq!(result.explanation, "Total revenue");
        assert_eq!(result.visualization_type, VisualizationType::Scalar);

        let calls = provider.calls.lock().unwrap();
        let (messages, options) = &calls[0];
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "total revenue?");
        assert_eq!(options.temperature, 0.0);
        assert!(options.json_response);
    }

    #[tokio::test]
    async fn test_denylisted_keyword_is_rejected() {
        let provider = Arc::new(ScriptedProvider::replying(
            r#"{"sql": "DROP TABLE sales_insights.sales_orders", "explanation": "", "visualization_type": "table"}"#,
        ));
        let err = generator(Some(provider)).generate("drop everything").await.unwrap_err();

        assert!(matches!(err, AskError::UnsafeQuery { ref keyword } if keyword == "DROP"));
    }

    #[tokio::test]
    async fn test_missing_schema_prefix_is_rejected() {
        let provider = Arc::new(ScriptedProvider::replying(
            r#"{"sql": "SELECT * FROM sales_orders", "explanation": "All orders"}"#,
        ));
        let err = generator(Some(provider)).generate("all orders please").await.unwrap_err();

        assert!(matches!(err, AskError::SchemaViolation { .. }));
    }

    #[tokio::test]
    async fn test_blank_model_reply_is_parse_error() {
        let provider = Arc::new(ScriptedProvider::replying("   "));
        let err = generator(Some(provider)).generate("total revenue?").await.unwrap_err();

        assert!(matches!(err, AskError::Parse(ref m) if m == "No response from model"));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_skips_all_io() {
        let lookup = Arc::new(CountingLookup::default());
        let cache = Arc::new(SchemaContextCache::new(
            lookup.clone(),
            Arc::new(FixedClock::at(Utc::now())),
            Duration::minutes(5),
        ));
        let err = SqlGenerator::new(cache, None, "sales_insights")
            .generate("total revenue?")
            .await
            .unwrap_err();

        assert!(matches!(err, AskError::Configuration));
        assert_eq!(lookup.refresh_count(), 0);
    }

    #[test]
    fn test_parse_reply_errors_and_defaults() {
        assert!(matches!(parse_reply(""), Err(AskError::Parse(_))));
        assert!(matches!(parse_reply("not json"), Err(AskError::Parse(_))));
        assert!(matches!(parse_reply(r#"{"explanation": "x"}"#), Err(AskError::Parse(_))));

        let result =
            parse_reply(r#"{"sql": "SELECT 1", "visualization_type": "heatmap"}"#).unwrap();
        assert_eq!(result.explanation, "");
        assert_eq!(result.visualization_type, VisualizationType::Table);
    }

    #[test]
    fn test_denylist_is_word_bounded() {
        let schema = "sales_insights";
        assert!(check_sql("SELECT created_at FROM sales_insights.sales_orders", schema).is_ok());
        assert!(check_sql("SELECT updated FROM sales_insights.x", schema).is_ok());
        assert!(matches!(
            check_sql("select 1; delete from sales_insights.x", "sales_insights"),
            Err(AskError::UnsafeQuery { .. })
        ));
    }
}
