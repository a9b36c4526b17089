//! # docfield-pdf: PDF Backend
//!
//! Implements the `PageRenderer` seam of the `docfield` crate. Page counting
//! and embedded text come from the pure-Rust `pdf` parser; rasterizing goes
//! through PDFium via `pdfium-render`.

mod raster;
mod text;

pub use raster::PdfiumRenderer;
pub use text::{count_pages, extract_page_text};

use docfield::DocfieldError;
use thiserror::Error;

// --- Error Definitions ---

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to parse PDF content: {0}")]
    Parse(String),
    #[error("Failed to bind the PDFium library: {0}")]
    Binding(String),
    #[error("Failed to render page {page}: {message}")]
    Render { page: u32, message: String },
    #[error("Failed to encode page {page} as PNG: {message}")]
    Encode { page: u32, message: String },
    #[error("Page {page} is out of range for a document with {total_pages} pages")]
    PageOutOfRange { page: u32, total_pages: u32 },
    #[error("An internal error occurred: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PdfError> for DocfieldError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::PageOutOfRange { page, total_pages } => {
                DocfieldError::PageOutOfRange { page, total_pages }
            }
            PdfError::Internal(e) => DocfieldError::Internal(e),
            other => DocfieldError::RenderFailure(other.to_string()),
        }
    }
}

/// Maps a 1-indexed page number to PDF's 0-indexed page, checking the range.
pub(crate) fn page_index(page_number: u32, total_pages: u32) -> Result<u32, PdfError> {
    if page_number == 0 || page_number > total_pages {
        return Err(PdfError::PageOutOfRange {
            page: page_number,
            total_pages,
        });
    }
    Ok(page_number - 1)
}
