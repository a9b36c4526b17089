//! # Page Renderer Interface
//!
//! The orchestrator only needs three things from a PDF backend: how many pages
//! a file has, a rasterized image of one page, and the page's embedded text.
//! The PDFium-backed implementation lives in the `docfield-pdf` crate.

use crate::{errors::DocfieldError, types::PageImage};
use async_trait::async_trait;
use std::fmt::Debug;

#[async_trait]
pub trait PageRenderer: Send + Sync + Debug {
    /// Counts the pages of a PDF. Fails with `RenderFailure` on unreadable content.
    async fn page_count(&self, pdf_data: &[u8]) -> Result<u32, DocfieldError>;

    /// Rasterizes a single 1-indexed page.
    ///
    /// Must be deterministic for the same bytes and page number, and must fail
    /// with `PageOutOfRange` or `RenderFailure` rather than returning a blank image.
    async fn render_page(&self, pdf_data: &[u8], page_number: u32)
        -> Result<PageImage, DocfieldError>;

    /// Returns the text embedded in a page, or `None` when it carries no text layer.
    async fn page_text(
        &self,
        pdf_data: &[u8],
        page_number: u32,
    ) -> Result<Option<String>, DocfieldError>;
}
