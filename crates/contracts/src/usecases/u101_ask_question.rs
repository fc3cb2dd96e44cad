use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::query_row::QueryRow;

pub const MIN_QUESTION_CHARS: usize = 5;
pub const MAX_QUESTION_CHARS: usize = 500;

/// POST /api/ask body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(rename = "includeSQL", default)]
    pub include_sql: bool,
}

impl AskRequest {
    /// Validate the request shape. Returns the message for a 400 response.
    pub fn validate(&self) -> Result<(), String> {
        let len = self.question.chars().count();
        if len < MIN_QUESTION_CHARS {
            return Err("Question too short".to_string());
        }
        if len > MAX_QUESTION_CHARS {
            return Err("Question too long".to_string());
        }
        Ok(())
    }
}

/// How the result rows should be rendered by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationType {
    Scalar,
    #[default]
    Table,
    Bar,
    Line,
    Pie,
}

impl VisualizationType {
    pub const ALL: [VisualizationType; 5] = [
        VisualizationType::Scalar,
        VisualizationType::Table,
        VisualizationType::Bar,
        VisualizationType::Line,
        VisualizationType::Pie,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualizationType::Scalar => "scalar",
            VisualizationType::Table => "table",
            VisualizationType::Bar => "bar",
            VisualizationType::Line => "line",
            VisualizationType::Pie => "pie",
        }
    }

    /// Case-insensitive lookup, `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for VisualizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visualization {
    #[serde(rename = "type")]
    pub kind: VisualizationType,
    pub data: Vec<QueryRow>,
}

/// POST /api/ask response. Errors after validation are reported through `answer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub visualization: Option<Visualization>,
    pub sql: Option<String>,
    #[serde(rename = "executionTimeMs", skip_serializing_if = "Option::is_none", default)]
    pub execution_time_ms: Option<u64>,
}

impl AskResponse {
    /// Answer-only response used when the pipeline degrades.
    pub fn message(answer: impl Into<String>, sql: Option<String>) -> Self {
        Self {
            answer: answer.into(),
            visualization: None,
            sql,
            execution_time_ms: None,
        }
    }
}

/// 400 body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(question: &str) -> AskRequest {
        AskRequest {
            question: question.to_string(),
            include_sql: false,
        }
    }

    #[test]
    fn test_question_length_bounds() {
        assert_eq!(request("abcd").validate(), Err("Question too short".to_string()));
        assert!(request("abcde").validate().is_ok());
        assert!(request(&"x".repeat(500)).validate().is_ok());
        assert_eq!(
            request(&"x".repeat(501)).validate(),
            Err("Question too long".to_string())
        );
    }

    #[test]
    fn test_include_sql_defaults_to_false() {
        let req: AskRequest = serde_json::from_str(r#"{"question":"total revenue"}"#).unwrap();
        assert!(!req.include_sql);
        let req: AskRequest =
            serde_json::from_str(r#"{"question":"total revenue","includeSQL":true}"#).unwrap();
        assert!(req.include_sql);
    }

    #[test]
    fn test_visualization_type_parse() {
        assert_eq!(VisualizationType::parse("Bar"), Some(VisualizationType::Bar));
        assert_eq!(VisualizationType::parse(" scalar "), Some(VisualizationType::Scalar));
        assert_eq!(VisualizationType::parse("heatmap"), None);
    }

    #[test]
    fn test_response_omits_missing_execution_time() {
        let json = serde_json::to_value(AskResponse::message("hi", None)).unwrap();
        assert_eq!(json, serde_json::json!({"answer": "hi", "visualization": null, "sql": null}));
    }
}
