//! Process-wide configuration, read from the environment once at startup.
//!
//! The API credential is validated eagerly here so a missing key fails the
//! process at boot instead of surfacing on the first upload.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration shared by every component; built once in `main` and passed
/// explicitly (no ambient globals).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// OpenAI API key (required).
    pub api_key: String,
    /// Model used for vision OCR calls.
    pub ocr_model: String,
    /// Model used for summarization calls.
    pub summary_model: String,
    /// Embedded text shorter than this (after trimming) sends a page to OCR.
    pub text_threshold: usize,
    /// Rasterization resolution for OCR-bound pages.
    pub raster_dpi: f32,
    /// Per-call timeout for outbound model requests.
    pub request_timeout: Duration,
    /// Additional attempts after a failed model call (0 disables retry).
    pub max_retries: u32,
    /// Listen address for the HTTP server.
    pub bind_addr: String,
    /// Upload size cap enforced by the body limit layer.
    pub max_upload_bytes: usize,
    /// Character budget for text handed to the summarizer.
    pub summary_input_budget: usize,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY environment variable not set")?;
        if api_key.trim().is_empty() {
            anyhow::bail!("OPENAI_API_KEY is set but empty");
        }

        Ok(Self {
            api_key,
            ocr_model: env_or("VISIONTEXT_OCR_MODEL", DEFAULT_MODEL.to_string())?,
            summary_model: env_or("VISIONTEXT_SUMMARY_MODEL", DEFAULT_MODEL.to_string())?,
            text_threshold: env_or("VISIONTEXT_TEXT_THRESHOLD", 20)?,
            raster_dpi: env_or("VISIONTEXT_RASTER_DPI", 150.0)?,
            request_timeout: Duration::from_secs(env_or("VISIONTEXT_TIMEOUT_SECS", 60)?),
            max_retries: env_or("VISIONTEXT_MAX_RETRIES", 2)?,
            bind_addr: env_or("VISIONTEXT_BIND", "0.0.0.0:3000".to_string())?,
            max_upload_bytes: env_or::<usize>("VISIONTEXT_MAX_UPLOAD_MB", 50)? * 1024 * 1024,
            summary_input_budget: env_or("VISIONTEXT_SUMMARY_INPUT_BUDGET", 150_000)?,
        })
    }
}

/// Parse an env var, falling back to `default` when unset.
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_default() {
        assert_eq!(env_or("VISIONTEXT_TEST_UNSET_VAR", 20usize).unwrap(), 20);
    }

    #[test]
    fn test_env_or_parses() {
        env::set_var("VISIONTEXT_TEST_THRESHOLD_VAR", "35");
        assert_eq!(env_or("VISIONTEXT_TEST_THRESHOLD_VAR", 20usize).unwrap(), 35);
        env::remove_var("VISIONTEXT_TEST_THRESHOLD_VAR");
    }

    #[test]
    fn test_env_or_rejects_garbage() {
        env::set_var("VISIONTEXT_TEST_BAD_VAR", "not-a-number");
        assert!(env_or("VISIONTEXT_TEST_BAD_VAR", 20usize).is_err());
        env::remove_var("VISIONTEXT_TEST_BAD_VAR");
    }
}
