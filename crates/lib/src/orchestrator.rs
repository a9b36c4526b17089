//! # Extraction Orchestrator
//!
//! Drives an upload through the pipeline: field list normalization, upload
//! validation, page counting, document creation and per-page extraction. It is
//! also the entry point for single-page re-extraction and the page viewer.

use crate::{
    errors::DocfieldError,
    extractor::FieldExtractor,
    fields::normalize_fields,
    render::PageRenderer,
    store::DocumentStore,
    types::{Document, PageImage, PageResult},
};
use chrono::Utc;
use futures::{stream, StreamExt, TryStreamExt};
use std::{sync::Arc, time::Instant};
use tracing::{info, instrument, warn};

pub const DEFAULT_EXTRACTION_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct Orchestrator {
    store: Arc<DocumentStore>,
    renderer: Arc<dyn PageRenderer>,
    extractor: Arc<FieldExtractor>,
    concurrency: usize,
}

impl Orchestrator {
    pub fn new(
        store: Arc<DocumentStore>,
        renderer: Arc<dyn PageRenderer>,
        extractor: Arc<FieldExtractor>,
    ) -> Self {
        Self {
            store,
            renderer,
            extractor,
            concurrency: DEFAULT_EXTRACTION_CONCURRENCY,
        }
    }

    /// Sets how many pages of one upload are extracted at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    /// Stores an uploaded PDF and extracts `field_names` from every page.
    ///
    /// Nothing is kept when any step fails: the document and its file are
    /// discarded and the first error is returned.
    #[instrument(skip(self, pdf_data, field_names), fields(size = pdf_data.len()))]
    pub async fn process_document(
        &self,
        pdf_data: &[u8],
        filename: &str,
        field_names: &[String],
    ) -> Result<Document, DocfieldError> {
        let key_fields = normalize_fields(field_names)?;
        self.store.validate_upload(pdf_data)?;

        let total_pages = self.renderer.page_count(pdf_data).await?;
        if total_pages == 0 {
            return Err(DocfieldError::RenderFailure(
                "the PDF has no pages".to_string(),
            ));
        }

        let document = self
            .store
            .create_document(pdf_data, filename, key_fields.clone(), total_pages)
            .await?;
        let doc_id = document.doc_id.clone();
        info!(%doc_id, total_pages, fields = ?key_fields, "Extracting fields from every page.");

        match self
            .extract_all_pages(&doc_id, pdf_data, total_pages, &key_fields)
            .await
        {
            Ok(()) => {
                self.store.mark_completed(&doc_id)?;
                info!(%doc_id, "Document processing completed.");
                self.store.get_document(&doc_id)
            }
            Err(e) => {
                warn!(%doc_id, "Document processing failed, discarding upload: {e}");
                self.store.discard(&doc_id).await;
                Err(e)
            }
        }
    }

    async fn extract_all_pages(
        &self,
        doc_id: &str,
        pdf_data: &[u8],
        total_pages: u32,
        key_fields: &[String],
    ) -> Result<(), DocfieldError> {
        let results: Vec<PageResult> = stream::iter(1..=total_pages)
            .map(|page_number| self.extract_page(doc_id, pdf_data, page_number, key_fields))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        for result in results {
            self.store
                .replace_page_result(doc_id, result.page_number, result)?;
        }
        Ok(())
    }

    /// Re-runs extraction on one page with a new field list.
    ///
    /// Only that page's stored result is replaced. The document's upload-time
    /// field list is left as it was.
    #[instrument(skip(self, field_names))]
    pub async fn reextract_page(
        &self,
        doc_id: &str,
        page_number: u32,
        field_names: &[String],
    ) -> Result<PageResult, DocfieldError> {
        let key_fields = normalize_fields(field_names)?;
        let document = self.checked_document(doc_id, page_number)?;
        let pdf_data = tokio::fs::read(&document.file_path).await?;

        let result = self
            .extract_page(doc_id, &pdf_data, page_number, &key_fields)
            .await?;
        self.store
            .replace_page_result(doc_id, page_number, result.clone())?;
        info!(%doc_id, page = page_number, "Replaced page result.");
        Ok(result)
    }

    /// Renders one stored page for display.
    #[instrument(skip(self))]
    pub async fn page_image(
        &self,
        doc_id: &str,
        page_number: u32,
    ) -> Result<PageImage, DocfieldError> {
        let document = self.checked_document(doc_id, page_number)?;
        let pdf_data = tokio::fs::read(&document.file_path).await?;
        self.renderer.render_page(&pdf_data, page_number).await
    }

    /// Returns the ISO 639-1 code of the dominant language on a stored page.
    #[instrument(skip(self))]
    pub async fn detect_page_language(
        &self,
        doc_id: &str,
        page_number: u32,
    ) -> Result<String, DocfieldError> {
        let image = self.page_image(doc_id, page_number).await?;
        self.extractor.detect_language(&image).await
    }

    #[instrument(name = "page", skip(self, pdf_data, key_fields), fields(doc_id = %doc_id, page = page_number))]
    async fn extract_page(
        &self,
        doc_id: &str,
        pdf_data: &[u8],
        page_number: u32,
        key_fields: &[String],
    ) -> Result<PageResult, DocfieldError> {
        let started = Instant::now();

        let image = self.renderer.render_page(pdf_data, page_number).await?;
        let text_content = match self.renderer.page_text(pdf_data, page_number).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not read embedded page text: {e}");
                None
            }
        };
        let extracted_fields = self.extractor.extract_fields(&image, key_fields).await?;

        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            found = extracted_fields.len(),
            requested = key_fields.len(),
            processing_time_ms,
            "Page extracted."
        );

        Ok(PageResult {
            page_number,
            key_fields: key_fields.to_vec(),
            extracted_fields,
            text_content,
            processing_time_ms,
            extracted_at: Utc::now(),
        })
    }

    fn checked_document(&self, doc_id: &str, page_number: u32) -> Result<Document, DocfieldError> {
        let document = self.store.get_document(doc_id)?;
        if !document.contains_page(page_number) {
            return Err(DocfieldError::PageOutOfRange {
                page: page_number,
                total_pages: document.total_pages,
            });
        }
        Ok(document)
    }
}
