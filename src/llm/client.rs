use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::error::LlmError;
use crate::llm::dto::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

/// One call to the text-generation endpoint: a system instruction, a single
/// user turn and a token budget.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
}

/// The seam the orchestrator talks through. Tests script this; production
/// uses [`OpenAiClient`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;
}

/// Chat-completions client for an OpenAI-compatible endpoint.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &GenerationConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: request.prompt.clone(),
                },
            ],
            temperature: Some(0.7),
            max_tokens: Some(request.max_tokens),
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "generation endpoint returned an error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Transport(e)
            }
        })?;
        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                total_tokens = usage.total_tokens,
                "generation call usage"
            );
        }

        let choice = parsed.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;
        if choice.finish_reason.as_deref() == Some("length") {
            warn!("generation stopped at the token budget; response may be truncated");
        }
        Ok(choice.message.content)
    }
}
