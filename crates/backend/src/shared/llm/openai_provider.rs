use super::types::{
    ChatMessage, ChatRole, CompletionOptions, LlmError, LlmProvider, LlmResponse,
};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;

use crate::shared::config::LlmConfig;

/// OpenAI provider
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    /// Create with a custom endpoint (OpenAI compatible APIs)
    pub fn new_with_endpoint(api_endpoint: String, api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_endpoint);
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    /// Build a provider from configuration, `None` when no API key is set
    pub fn from_config(config: &LlmConfig) -> Option<Self> {
        let api_key = config.api_key()?.to_string();
        let provider = match config.api_base.as_deref().filter(|b| !b.trim().is_empty()) {
            Some(base) => Self::new_with_endpoint(base.to_string(), api_key, config.model.clone()),
            None => Self::new(api_key, config.model.clone()),
        };
        Some(provider)
    }

    /// Convert our messages into the OpenAI request format
    fn convert_messages(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
        messages
            .into_iter()
            .map(|msg| {
                let converted: ChatCompletionRequestMessage = match msg.role {
                    ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(msg.content)
                        .build()
                        .map_err(|e| LlmError::InvalidRequest(e.to_string()))?
                        .into(),
                    ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(msg.content)
                        .build()
                        .map_err(|e| LlmError::InvalidRequest(e.to_string()))?
                        .into(),
                };
                Ok(converted)
            })
            .collect()
    }

    /// Whether the model accepts custom sampling parameters.
    ///
    /// gpt-5 and o1/o3 models only accept the default temperature and reject
    /// max_completion_tokens.
    fn supports_advanced_params(model_id: &str) -> bool {
        let is_restricted = model_id.starts_with("gpt-5")
            || model_id.starts_with("o1-")
            || model_id.starts_with("o3-");

        !is_restricted
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<LlmResponse, LlmError> {
        let openai_messages = self.convert_messages(messages)?;

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model).messages(openai_messages);

        if options.json_response {
            request_builder.response_format(ResponseFormat::JsonObject);
        }

        if Self::supports_advanced_params(&self.model) {
            request_builder.temperature(options.temperature);
            if let Some(max_tokens) = options.max_tokens {
                request_builder.max_completion_tokens(max_tokens);
            }
        }

        let request = request_builder
            .build()
            .map_err(|e| LlmError::InvalidRequest(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("401") || err_str.contains("authentication") {
                LlmError::AuthError(err_str)
            } else if err_str.contains("429") || err_str.contains("rate limit") {
                LlmError::RateLimitExceeded
            } else {
                LlmError::ApiError(err_str)
            }
        })?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| LlmError::ApiError("No response from API".to_string()))?;

        let content = reply_content(choice.message.content.clone())?;
        let tokens_used = response.usage.as_ref().map(|u| u.total_tokens as i32);
        let finish_reason = choice.finish_reason.as_ref().map(|r| format!("{:?}", r));

        tracing::debug!(
            "{} completion: model={}, tokens={:?}, finish={:?}",
            self.provider_name(),
            response.model,
            tokens_used,
            finish_reason
        );

        Ok(LlmResponse {
            content,
            tokens_used,
            model: response.model.clone(),
            finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }
}

fn reply_content(content: Option<String>) -> Result<String, LlmError> {
    content
        .filter(|c| !c.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)
}
