//! PDFium-backed rasterizing.

use crate::{page_index, text, PdfError};
use async_trait::async_trait;
use docfield::{DocfieldError, PageImage, PageRenderer};
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::{io::Cursor, path::PathBuf};
use tracing::{debug, instrument};

pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// Renders pages through PDFium at `scale` times the page's natural 72 DPI size.
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    library_path: Option<PathBuf>,
    scale: f32,
}

impl Default for PdfiumRenderer {
    fn default() -> Self {
        Self {
            library_path: None,
            scale: DEFAULT_RENDER_SCALE,
        }
    }
}

impl PdfiumRenderer {
    /// `library_path` is the directory holding the PDFium shared library.
    /// When it is `None` the system library is used.
    pub fn new(library_path: Option<PathBuf>, scale: f32) -> Self {
        Self {
            library_path,
            scale,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    fn bind(&self) -> Result<Pdfium, PdfError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path(
                path,
            ))
            .or_else(|_| Pdfium::bind_to_system_library()),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| PdfError::Binding(e.to_string()))?;
        Ok(Pdfium::new(bindings))
    }

    fn rasterize(&self, pdf_data: &[u8], page_number: u32) -> Result<PageImage, PdfError> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf_data, None)
            .map_err(|e| PdfError::Parse(format!("pdfium open failed: {e}")))?;

        let total_pages = document.pages().len() as u32;
        let index = page_index(page_number, total_pages)?;
        let page = document
            .pages()
            .get(index as u16)
            .map_err(|e| PdfError::Render {
                page: page_number,
                message: format!("page access failed: {e}"),
            })?;

        // Page sizes are in points, one point per pixel at 72 DPI.
        let width = (page.width().value * self.scale) as i32;
        let height = (page.height().value * self.scale) as i32;

        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(width)
                    .set_target_height(height),
            )
            .map_err(|e| PdfError::Render {
                page: page_number,
                message: e.to_string(),
            })?;

        let dynamic_image = bitmap.as_image();
        let mut png: Vec<u8> = Vec::new();
        dynamic_image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| PdfError::Encode {
                page: page_number,
                message: e.to_string(),
            })?;

        debug!(
            page = page_number,
            width = dynamic_image.width(),
            height = dynamic_image.height(),
            bytes = png.len(),
            "Rendered page."
        );
        Ok(PageImage {
            width: dynamic_image.width(),
            height: dynamic_image.height(),
            png,
        })
    }
}

#[async_trait]
impl PageRenderer for PdfiumRenderer {
    async fn page_count(&self, pdf_data: &[u8]) -> Result<u32, DocfieldError> {
        let data = pdf_data.to_vec();
        let count = tokio::task::spawn_blocking(move || text::count_pages(&data))
            .await
            .map_err(|e| DocfieldError::Internal(e.into()))??;
        Ok(count)
    }

    #[instrument(skip(self, pdf_data))]
    async fn render_page(
        &self,
        pdf_data: &[u8],
        page_number: u32,
    ) -> Result<PageImage, DocfieldError> {
        let renderer = self.clone();
        let data = pdf_data.to_vec();
        let image = tokio::task::spawn_blocking(move || renderer.rasterize(&data, page_number))
            .await
            .map_err(|e| DocfieldError::Internal(e.into()))??;
        Ok(image)
    }

    async fn page_text(
        &self,
        pdf_data: &[u8],
        page_number: u32,
    ) -> Result<Option<String>, DocfieldError> {
        let data = pdf_data.to_vec();
        let text = tokio::task::spawn_blocking(move || text::extract_page_text(&data, page_number))
            .await
            .map_err(|e| DocfieldError::Internal(e.into()))??;
        Ok(text)
    }
}
