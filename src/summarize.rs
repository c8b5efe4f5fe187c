//! Summarization client: one text-completion call with a fixed instruction.

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use crate::openai::{Message, OpenAiClient};

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes and explains \
     text in simple, easy-to-understand language.";

/// Submit text, get back a simplified summary.
#[async_trait::async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}

pub struct Summarizer {
    client: Arc<OpenAiClient>,
    model: String,
    /// Over-length input is cut at this many characters before prompting.
    input_budget: usize,
}

impl Summarizer {
    pub fn new(client: Arc<OpenAiClient>, model: impl Into<String>, input_budget: usize) -> Self {
        Self {
            client,
            model: model.into(),
            input_budget,
        }
    }
}

#[async_trait::async_trait]
impl Summarize for Summarizer {
    /// Summarize and simplify extracted text for end users.
    async fn summarize(&self, text: &str) -> Result<String> {
        let input = truncate_for_context(text, self.input_budget);
        debug!(
            "Summarizing {} chars ({} before truncation)",
            input.len(),
            text.len()
        );

        let messages = vec![
            Message::system(SUMMARY_SYSTEM_PROMPT),
            Message::user(format!("Summarize and explain this text simply:\n\n{}", input)),
        ];

        self.client.chat(&self.model, messages).await
    }
}

/// Cut `text` to at most `max_chars` bytes, backing up to a char boundary.
fn truncate_for_context(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        text
    } else {
        let mut end = max_chars;
        while !text.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        &text[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_input_untouched() {
        assert_eq!(truncate_for_context("hello", 100), "hello");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "aé"; // 'é' spans bytes 1..3
        assert_eq!(truncate_for_context(text, 2), "a");
        assert_eq!(truncate_for_context(text, 3), "aé");
    }

    #[test]
    fn test_truncate_long_input() {
        let text = "x".repeat(500);
        assert_eq!(truncate_for_context(&text, 100).len(), 100);
    }
}
