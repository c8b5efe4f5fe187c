//! OpenAI chat-completions client used for both OCR and summarization.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Shared client for chat completions. Carries the per-call timeout and a
/// bounded retry with exponential backoff; callers see only the final error.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    max_retries: u32,
}

impl OpenAiClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Send a chat completion request and return the message content.
    pub async fn chat(&self, model: &str, messages: Vec<Message>) -> Result<String> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
        };

        let mut backoff = Duration::from_millis(500);
        let mut attempt = 0;
        loop {
            match self.send_request(&request).await {
                Ok(content) => return Ok(content),
                Err(failure) if failure.retryable && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "OpenAI call failed (attempt {}/{}), retrying in {:?}: {:#}",
                        attempt, self.max_retries, backoff, failure.error
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    async fn send_request(&self, request: &ChatCompletionRequest) -> Result<String, CallFailure> {
        debug!("Sending request to OpenAI: model={}", request.model);

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CallFailure {
                retryable: true,
                error: anyhow::Error::new(e).context("Failed to send request to OpenAI"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            // Rate limits and upstream errors are worth retrying; auth and
            // request errors are not.
            let retryable = status.is_server_error() || status.as_u16() == 429;
            return Err(CallFailure {
                retryable,
                error: anyhow::anyhow!("OpenAI API error ({}): {}", status, error_text),
            });
        }

        let response: ChatCompletionResponse = response.json().await.map_err(|e| CallFailure {
            retryable: false,
            error: anyhow::Error::new(e).context("Failed to parse OpenAI response"),
        })?;

        if let Some(usage) = &response.usage {
            info!(
                "OpenAI response: {} tokens (prompt: {}, completion: {})",
                usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
            );
        }

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(CallFailure {
                retryable: false,
                error: anyhow::anyhow!("OpenAI returned no usable content"),
            });
        }

        Ok(content)
    }
}

struct CallFailure {
    retryable: bool,
    error: anyhow::Error,
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ============================================================================
// Message types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user message carrying an inline image as a data URI built
    /// from the image's declared MIME type.
    pub fn user_with_image(text: impl Into<String>, image: &[u8], mime_type: &str) -> Self {
        let data_url = format!("data:{};base64,{}", mime_type, BASE64.encode(image));
        Self {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ]),
        }
    }
}
