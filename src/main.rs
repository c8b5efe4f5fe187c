//! visiontext - Upload an image or PDF, get back extracted text and a
//! simplified summary.

mod classify;
mod config;
mod error;
mod extract;
mod ocr;
mod openai;
mod rasterize;
mod summarize;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::Json,
    routing::{get, post},
    Router,
};
use config::AppConfig;
use error::ExtractError;
use extract::HybridExtractor;
use ocr::{OcrEngine, VisionOcr};
use openai::OpenAiClient;
use rasterize::PdfiumRasterizer;
use std::sync::Arc;
use summarize::{Summarize, Summarizer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    ocr: Arc<dyn OcrEngine>,
    extractor: Arc<HybridExtractor>,
    summarizer: Arc<dyn Summarize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visiontext=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Credential is validated here, not on the first upload.
    let config = AppConfig::from_env()?;
    let client = Arc::new(OpenAiClient::new(&config)?);
    info!("OpenAI client initialized (ocr={})", config.ocr_model);

    let ocr: Arc<dyn OcrEngine> = Arc::new(VisionOcr::new(Arc::clone(&client), &config.ocr_model));
    let rasterizer = Arc::new(PdfiumRasterizer::new(config.raster_dpi));
    let extractor = Arc::new(HybridExtractor::new(
        Arc::clone(&ocr),
        rasterizer,
        config.text_threshold,
    ));
    let summarizer: Arc<dyn Summarize> = Arc::new(Summarizer::new(
        Arc::clone(&client),
        &config.summary_model,
        config.summary_input_budget,
    ));

    let state = AppState {
        ocr,
        extractor,
        summarizer,
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/extract-text/", post(extract_text))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Run server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, serde::Serialize)]
struct ExtractResponse {
    filename: String,
    extracted_text: String,
    summary: String,
}

/// Upload an image or PDF and extract + summarize its text.
async fn extract_text(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, ExtractError> {
    // Read the uploaded file
    let mut filename = String::new();
    let mut content_type = String::new();
    let mut file_data = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ExtractError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().unwrap_or("document").to_string();
            content_type = field.content_type().unwrap_or_default().to_string();
            file_data = field
                .bytes()
                .await
                .map_err(|e| ExtractError::BadRequest(format!("Failed to read file: {}", e)))?
                .to_vec();
            break;
        }
    }

    if file_data.is_empty() {
        return Err(ExtractError::BadRequest("No file uploaded".to_string()));
    }

    info!(
        "Received file: {} ({} bytes, {})",
        filename,
        file_data.len(),
        content_type
    );

    let response = process_upload(&state, filename, &content_type, &file_data).await?;
    Ok(Json(response))
}

/// Kind of upload we accept, keyed off the declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Image,
    Pdf,
}

fn validate_content_type(content_type: &str) -> Result<FileKind, ExtractError> {
    match content_type {
        "image/png" | "image/jpeg" | "image/jpg" => Ok(FileKind::Image),
        "application/pdf" => Ok(FileKind::Pdf),
        other => Err(ExtractError::UnsupportedType(other.to_string())),
    }
}

/// Type-sniff, extract, and summarize one upload.
async fn process_upload(
    state: &AppState,
    filename: String,
    content_type: &str,
    data: &[u8],
) -> Result<ExtractResponse, ExtractError> {
    let extracted_text = match validate_content_type(content_type)? {
        FileKind::Image => state
            .ocr
            .image_to_text(data, content_type)
            .await
            .map_err(ExtractError::ExternalService)?,
        FileKind::Pdf => state.extractor.extract_pdf(&filename, data).await?,
    };

    let summary = state
        .summarizer
        .summarize(&extracted_text)
        .await
        .map_err(ExtractError::ExternalService)?;

    info!("Extraction complete: {}", filename);
    Ok(ExtractResponse {
        filename,
        extracted_text: extracted_text.trim().to_string(),
        summary: summary.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::sync::Mutex;

    struct RecordingOcr {
        calls: Mutex<Vec<(Vec<u8>, String)>>,
        reply: String,
    }

    #[async_trait::async_trait]
    impl OcrEngine for RecordingOcr {
        async fn image_to_text(&self, image: &[u8], mime_type: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((image.to_vec(), mime_type.to_string()));
            Ok(self.reply.clone())
        }
    }

    struct FixedSummarizer(&'static str);

    #[async_trait::async_trait]
    impl Summarize for FixedSummarizer {
        async fn summarize(&self, _text: &str) -> Result<String> {
            Ok(format!(" {} ", self.0))
        }
    }

    fn test_state(ocr_reply: &str) -> (AppState, Arc<RecordingOcr>) {
        let ocr = Arc::new(RecordingOcr {
            calls: Mutex::new(Vec::new()),
            reply: ocr_reply.to_string(),
        });

        struct NoRasterizer;
        #[async_trait::async_trait]
        impl rasterize::PageRasterizer for NoRasterizer {
            async fn rasterize(
                &self,
                _pdf: &[u8],
                _pages: &[usize],
            ) -> Result<std::collections::HashMap<usize, Vec<u8>>> {
                anyhow::bail!("rasterizer should not run in these tests")
            }
        }

        let extractor = Arc::new(HybridExtractor::new(
            Arc::clone(&ocr) as Arc<dyn OcrEngine>,
            Arc::new(NoRasterizer),
            20,
        ));
        let state = AppState {
            ocr: Arc::clone(&ocr) as Arc<dyn OcrEngine>,
            extractor,
            summarizer: Arc::new(FixedSummarizer("A short summary.")),
        };
        (state, ocr)
    }

    #[test]
    fn test_validate_content_type() {
        assert_eq!(validate_content_type("image/png").unwrap(), FileKind::Image);
        assert_eq!(validate_content_type("image/jpeg").unwrap(), FileKind::Image);
        assert_eq!(validate_content_type("image/jpg").unwrap(), FileKind::Image);
        assert_eq!(
            validate_content_type("application/pdf").unwrap(),
            FileKind::Pdf
        );
    }

    #[test]
    fn test_rejects_text_plain_by_name() {
        let err = validate_content_type("text/plain").unwrap_err();
        assert!(err.to_string().contains("text/plain"));
        assert_eq!(err.code(), "unsupported_type");
    }

    #[tokio::test]
    async fn test_image_upload_flows_through_ocr_once() {
        let (state, ocr) = test_state(" HELLO WORLD \n");
        let image = vec![0x89, b'P', b'N', b'G', 1, 2, 3];

        let response = process_upload(&state, "hello.png".to_string(), "image/png", &image)
            .await
            .unwrap();

        let calls = ocr.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, image);
        assert_eq!(calls[0].1, "image/png");

        assert_eq!(response.filename, "hello.png");
        assert_eq!(response.extracted_text, "HELLO WORLD");
        assert_eq!(response.summary, "A short summary.");
        assert_ne!(response.summary, response.extracted_text);
    }

    #[tokio::test]
    async fn test_unsupported_upload_never_reaches_ocr() {
        let (state, ocr) = test_state("unused");

        let err = process_upload(&state, "notes.txt".to_string(), "text/plain", b"hi")
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractError::UnsupportedType(_)));
        assert!(ocr.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_response_serialization_shape() {
        let response = ExtractResponse {
            filename: "a.pdf".to_string(),
            extracted_text: "text".to_string(),
            summary: "sum".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["filename"], "a.pdf");
        assert_eq!(json["extracted_text"], "text");
        assert_eq!(json["summary"], "sum");
    }
}
