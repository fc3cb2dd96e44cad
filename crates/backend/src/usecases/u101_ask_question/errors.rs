use thiserror::Error;

/// Failures of the ask pipeline. All of them end up as a 200 answer at the HTTP boundary.
#[derive(Debug, Error)]
pub enum AskError {
    /// No model credential configured
    #[error("OpenAI API key not configured")]
    Configuration,

    /// Model reply is empty, not JSON, or has no `sql` field
    #[error("Could not read the model reply: {0}")]
    Parse(String),

    /// Generated SQL contains a data-mutating keyword
    #[error("Only SELECT queries are allowed")]
    UnsafeQuery { keyword: String },

    /// Generated SQL is not qualified with the analytics schema
    #[error("Query must use {schema} schema")]
    SchemaViolation { schema: String },

    /// The database rejected the generated SQL
    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    /// Schema context lookups failed
    #[error("Database context unavailable: {0}")]
    ContextUnavailable(String),

    /// Transport-level model failure
    #[error("Language model request failed: {0}")]
    Llm(#[from] crate::shared::llm::LlmError),
}

impl AskError {
    /// Sentence shown to the user instead of a hard failure
    pub fn user_message(&self) -> String {
        match self {
            AskError::Configuration => "AI Q&A is not configured. \
                Please add your OpenAI API key to the environment variables."
                .to_string(),
            AskError::QueryExecution(_) => "Sorry, there was an error executing the query. \
                Please try rephrasing your question."
                .to_string(),
            other => format!("Sorry, I encountered an error: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AskError::Configuration.user_message(),
            "AI Q&A is not configured. Please add your OpenAI API key to the environment variables."
        );
        assert!(AskError::QueryExecution("syntax error".into())
            .user_message()
            .starts_with("Sorry, there was an error executing the query"));
        assert_eq!(
            AskError::UnsafeQuery { keyword: "DROP".into() }.user_message(),
            "Sorry, I encountered an error: Only SELECT queries are allowed"
        );
        assert_eq!(
            AskError::SchemaViolation { schema: "sales_insights".into() }.user_message(),
            "Sorry, I encountered an error: Query must use sales_insights schema"
        );
    }
}
