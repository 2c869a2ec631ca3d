//! Chat completions client
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::config::LlmConfig;
use crate::error::BuddyError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat completions request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Provider-neutral completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Constrain the output to a single JSON object
    pub json_object: bool,
}

/// Trait for a remote language model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns `Ok(None)` when the model answered without content.
    async fn complete(&self, request: &ChatRequest) -> Result<Option<String>>;
}

/// Model handle owned by the conversation service.
#[derive(Clone)]
pub enum ModelBackend {
    Configured(Arc<dyn ChatModel>),
    NotConfigured,
}

impl ModelBackend {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        match &config.api_key {
            Some(api_key) => {
                let client = OpenAiClient::new(
                    api_key.clone(),
                    config.base_url.clone(),
                    config.model.clone(),
                    config.timeout,
                )?;
                info!(model = %config.model, "Chat completions client configured");
                Ok(ModelBackend::Configured(Arc::new(client)))
            }
            None => {
                info!("No chat completions API key, conversation service disabled");
                Ok(ModelBackend::NotConfigured)
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, ModelBackend::Configured(_))
    }
}

/// Reusable chat completions client (connection-pooled)
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<Option<String>> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = CompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .json_object
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        info!(
            model = %self.model,
            turns = request.messages.len(),
            "Calling chat completions API"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Chat completions request failed: {}", e);
                BuddyError::LlmError(format!("Chat completions request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Chat completions API error response ({}): {}", status, error_text);
            return Err(BuddyError::LlmError(format!(
                "Chat completions API error {}: {}",
                status, error_text
            )));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse chat completions response: {}", e);
            BuddyError::LlmError(format!("Chat completions parse error: {}", e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);

        info!(
            has_content = content.is_some(),
            "Chat completions response received"
        );

        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
