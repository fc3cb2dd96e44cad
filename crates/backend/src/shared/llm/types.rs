use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// LLM provider errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Empty response from model")]
    EmptyResponse,
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Per-call sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask the model for a single JSON object reply
    pub json_response: bool,
}

impl CompletionOptions {
    /// Deterministic JSON-object reply (text-to-SQL)
    pub fn json_deterministic() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
            json_response: true,
        }
    }

    /// Free-text reply
    pub fn text(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens: Some(max_tokens),
            json_response: false,
        }
    }
}

/// LLM reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub tokens_used: Option<i32>,
    pub model: String,
    pub finish_reason: Option<String>,
}

/// LLM provider trait
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request.
    ///
    /// A missing or blank reply is reported as [`LlmError::EmptyResponse`].
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<LlmResponse, LlmError>;

    /// Provider name for logs
    fn provider_name(&self) -> &str;
}

#[cfg(test)]
pub mod testing {
    //! Scripted provider for unit tests.

    use super::*;
    use std::sync::Mutex;

    pub struct ScriptedProvider {
        reply: Result<String, String>,
        pub calls: Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>,
    }

    impl ScriptedProvider {
        pub fn replying(content: impl Into<String>) -> Self {
            Self {
                reply: Ok(content.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                reply: Err(message.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn chat_completion(
            &self,
            messages: Vec<ChatMessage>,
            options: &CompletionOptions,
        ) -> Result<LlmResponse, LlmError> {
            self.calls.lock().unwrap().push((messages, options.clone()));
            match &self.reply {
                Ok(content) if content.trim().is_empty() => Err(LlmError::EmptyResponse),
                Ok(content) => Ok(LlmResponse {
                    content: content.clone(),
                    tokens_used: Some(42),
                    model: "scripted".to_string(),
                    finish_reason: Some("Stop".to_string()),
                }),
                Err(message) => Err(LlmError::ApiError(message.clone())),
            }
        }

        fn provider_name(&self) -> &str {
            "Scripted"
        }
    }
}
