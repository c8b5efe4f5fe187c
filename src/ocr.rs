//! Vision OCR client.
//!
//! Defines the [`OcrEngine`] trait so the extraction orchestrator can be
//! exercised with test doubles, plus the OpenAI-backed implementation.

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use crate::openai::{Message, OpenAiClient};

const OCR_SYSTEM_PROMPT: &str =
    "You are an OCR assistant. Extract all readable text from the image.";
const OCR_USER_PROMPT: &str = "Please extract the text from this image.";

/// Submit one image, get back its text. One outbound call per invocation,
/// no caching, no local state.
#[async_trait::async_trait]
pub trait OcrEngine: Send + Sync {
    async fn image_to_text(&self, image: &[u8], mime_type: &str) -> Result<String>;
}

/// OCR through an OpenAI vision-capable model.
pub struct VisionOcr {
    client: Arc<OpenAiClient>,
    model: String,
}

impl VisionOcr {
    pub fn new(client: Arc<OpenAiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait::async_trait]
impl OcrEngine for VisionOcr {
    async fn image_to_text(&self, image: &[u8], mime_type: &str) -> Result<String> {
        debug!("OCR call: {} bytes, mime={}", image.len(), mime_type);

        let messages = vec![
            Message::system(OCR_SYSTEM_PROMPT),
            Message::user_with_image(OCR_USER_PROMPT, image, mime_type),
        ];

        self.client.chat(&self.model, messages).await
    }
}
