//! PDF page rasterization for the OCR fallback path.
//!
//! Only pages the classifier flags are rendered. The whole batch runs under
//! one `spawn_blocking` call because pdfium is blocking and not async-safe,
//! and one pass amortizes the document-decode cost across pages.

use anyhow::{Context, Result};
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

/// Render a set of zero-based page indices to PNG bytes.
#[async_trait::async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn rasterize(&self, pdf: &[u8], pages: &[usize]) -> Result<HashMap<usize, Vec<u8>>>;
}

/// pdfium-backed rasterizer. 150 DPI by default: high enough for legible
/// OCR, low enough to keep render and upload costs bounded.
pub struct PdfiumRasterizer {
    dpi: f32,
}

impl PdfiumRasterizer {
    pub fn new(dpi: f32) -> Self {
        Self { dpi }
    }
}

#[async_trait::async_trait]
impl PageRasterizer for PdfiumRasterizer {
    async fn rasterize(&self, pdf: &[u8], pages: &[usize]) -> Result<HashMap<usize, Vec<u8>>> {
        let data = pdf.to_vec();
        let indices = pages.to_vec();
        let dpi = self.dpi;

        tokio::task::spawn_blocking(move || render_pages(&data, &indices, dpi))
            .await
            .context("rasterization task panicked")?
    }
}

/// Searches for libpdfium next to the binary, then in the system paths.
fn bind_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| anyhow::anyhow!("Failed to load pdfium library: {:?}", e))?;
    Ok(Pdfium::new(bindings))
}

fn render_pages(data: &[u8], indices: &[usize], dpi: f32) -> Result<HashMap<usize, Vec<u8>>> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(|e| anyhow::anyhow!("Failed to load PDF: {:?}", e))?;

    // PDF user space is 72 points per inch.
    let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi / 72.0);

    let mut images = HashMap::with_capacity(indices.len());
    for &index in indices {
        let page = document
            .pages()
            .get(index as u16)
            .map_err(|e| anyhow::anyhow!("Failed to load page {}: {:?}", index, e))?;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| anyhow::anyhow!("Failed to render page {}: {:?}", index, e))?;

        let mut png = Vec::new();
        bitmap
            .as_image()
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .with_context(|| format!("Failed to encode page {} as PNG", index))?;

        debug!("Rasterized page {} at {} DPI ({} bytes)", index, dpi, png.len());
        images.insert(index, png);
    }

    Ok(images)
}
