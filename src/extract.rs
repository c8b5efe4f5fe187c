//! Hybrid PDF extraction pipeline.
//!
//! Per page: try embedded text first, classify it, and send only the pages
//! that fail classification through rasterize + OCR. OCR calls for one
//! document are issued concurrently (they are network-bound, and page count
//! multiplies latency if run sequentially); the final text is reassembled in
//! ascending page order regardless of completion order.

use anyhow::Context;
use futures::future::try_join_all;
use lopdf::Document;
use std::sync::Arc;
use tracing::{debug, info};

use crate::classify::{classify_page, PageClass};
use crate::error::ExtractError;
use crate::ocr::OcrEngine;
use crate::rasterize::PageRasterizer;

/// Extraction pipeline orchestrator. Holds no per-request state; every call
/// operates only on its own document.
pub struct HybridExtractor {
    ocr: Arc<dyn OcrEngine>,
    rasterizer: Arc<dyn PageRasterizer>,
    text_threshold: usize,
}

impl HybridExtractor {
    pub fn new(
        ocr: Arc<dyn OcrEngine>,
        rasterizer: Arc<dyn PageRasterizer>,
        text_threshold: usize,
    ) -> Self {
        Self {
            ocr,
            rasterizer,
            text_threshold,
        }
    }

    /// Extract the full text of a PDF, page order preserved.
    ///
    /// Failure is all-or-nothing: the first failed OCR call fails the whole
    /// document and drops its in-flight siblings.
    pub async fn extract_pdf(&self, filename: &str, data: &[u8]) -> Result<String, ExtractError> {
        let doc = Document::load_mem(data)
            .map_err(|e| ExtractError::Rasterization(format!("Failed to load PDF: {}", e)))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let page_count = page_numbers.len();

        // One slot per page; embedded-path pages are done immediately,
        // OCR-path pages are filled in after the fan-in.
        let mut slots: Vec<Option<String>> = vec![None; page_count];
        let mut flagged: Vec<usize> = Vec::new();

        for (index, page_num) in page_numbers.iter().enumerate() {
            let embedded = doc.extract_text(&[*page_num]).ok();
            match classify_page(embedded.as_deref(), self.text_threshold) {
                // UseEmbedded implies the text was present
                PageClass::UseEmbedded => slots[index] = embedded,
                PageClass::NeedsOcr => flagged.push(index),
            }
        }

        info!(
            "{}: {} pages, {} flagged for OCR",
            filename,
            page_count,
            flagged.len()
        );

        if !flagged.is_empty() {
            // Batch render: one document decode for all flagged pages.
            let images = self
                .rasterizer
                .rasterize(data, &flagged)
                .await
                .map_err(|e| ExtractError::Rasterization(format!("{:#}", e)))?;

            let mut jobs: Vec<(usize, &Vec<u8>)> = Vec::with_capacity(flagged.len());
            for &index in &flagged {
                let image = images.get(&index).ok_or_else(|| {
                    ExtractError::Rasterization(format!("No rendered image for page {}", index))
                })?;
                jobs.push((index, image));
            }

            // Fan out one OCR call per flagged page, fail-fast on the first
            // error.
            let ocr_results = try_join_all(jobs.into_iter().map(|(index, image)| {
                let ocr = Arc::clone(&self.ocr);
                let filename = filename.to_string();
                async move {
                    debug!("OCR dispatch: {} page {}", filename, index);
                    let text = ocr
                        .image_to_text(image, "image/png")
                        .await
                        .with_context(|| format!("OCR failed for {} page {}", filename, index))?;
                    Ok::<_, anyhow::Error>((index, text))
                }
            }))
            .await
            .map_err(ExtractError::ExternalService)?;

            for (index, text) in ocr_results {
                slots[index] = Some(text);
            }
        }

        debug_assert!(slots.iter().all(Option::is_some));
        Ok(slots
            .into_iter()
            .map(|s| s.unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
