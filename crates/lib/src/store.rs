//! # Document Store
//!
//! The store owns every uploaded document and its per-page results for the
//! lifetime of the process. Uploaded files are written to the upload directory
//! as `<doc_id>.pdf`. Page results are kept in a map keyed by page number, so
//! replacing one page never touches another page's entry.

use crate::{
    errors::DocfieldError,
    types::{Document, PageResult, ProcessingStatus},
};
use chrono::Utc;
use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::{info, warn};
use uuid::Uuid;

/// Every PDF starts with this header.
const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug)]
pub struct DocumentStore {
    upload_dir: PathBuf,
    max_file_size: usize,
    documents: RwLock<HashMap<String, Document>>,
}

impl DocumentStore {
    /// Creates a store backed by `upload_dir`, creating the directory if needed.
    pub fn new(upload_dir: impl Into<PathBuf>, max_file_size: usize) -> Result<Self, DocfieldError> {
        let upload_dir = upload_dir.into();
        std::fs::create_dir_all(&upload_dir)?;
        Ok(Self {
            upload_dir,
            max_file_size,
            documents: RwLock::new(HashMap::new()),
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Checks an upload's size and file kind before anything else touches it.
    pub fn validate_upload(&self, pdf_data: &[u8]) -> Result<(), DocfieldError> {
        if pdf_data.len() > self.max_file_size {
            return Err(DocfieldError::FileTooLarge {
                size: pdf_data.len(),
                limit: self.max_file_size,
            });
        }
        if !pdf_data.starts_with(PDF_MAGIC) {
            return Err(DocfieldError::InvalidFileKind(
                "payload does not start with a PDF header".to_string(),
            ));
        }
        Ok(())
    }

    /// Registers a new document and writes its file to the upload directory.
    pub async fn create_document(
        &self,
        pdf_data: &[u8],
        filename: &str,
        key_fields: Vec<String>,
        total_pages: u32,
    ) -> Result<Document, DocfieldError> {
        self.validate_upload(pdf_data)?;

        let doc_id = Uuid::new_v4().to_string();
        let file_path = self.upload_dir.join(format!("{doc_id}.pdf"));
        tokio::fs::write(&file_path, pdf_data).await?;

        let document = Document {
            doc_id: doc_id.clone(),
            filename: filename.to_string(),
            file_path,
            total_pages,
            key_fields,
            pages: BTreeMap::new(),
            processing_status: ProcessingStatus::Processing,
            created_at: Utc::now(),
        };

        self.write().insert(doc_id.clone(), document.clone());
        info!(%doc_id, filename, total_pages, "Created document.");
        Ok(document)
    }

    /// Returns a snapshot of a document and its current page results.
    pub fn get_document(&self, doc_id: &str) -> Result<Document, DocfieldError> {
        self.read()
            .get(doc_id)
            .cloned()
            .ok_or_else(|| not_found(doc_id))
    }

    /// Returns the stored result of one page.
    pub fn get_page_result(
        &self,
        doc_id: &str,
        page_number: u32,
    ) -> Result<PageResult, DocfieldError> {
        let documents = self.read();
        let document = documents.get(doc_id).ok_or_else(|| not_found(doc_id))?;
        check_page(document, page_number)?;
        document.pages.get(&page_number).cloned().ok_or_else(|| {
            DocfieldError::NotFound(format!(
                "page {page_number} of document '{doc_id}' has not been extracted"
            ))
        })
    }

    /// Replaces one page's stored result wholesale.
    pub fn replace_page_result(
        &self,
        doc_id: &str,
        page_number: u32,
        result: PageResult,
    ) -> Result<(), DocfieldError> {
        let mut documents = self.write();
        let document = documents.get_mut(doc_id).ok_or_else(|| not_found(doc_id))?;
        check_page(document, page_number)?;
        document.pages.insert(page_number, result);
        Ok(())
    }

    pub fn mark_completed(&self, doc_id: &str) -> Result<(), DocfieldError> {
        let mut documents = self.write();
        let document = documents.get_mut(doc_id).ok_or_else(|| not_found(doc_id))?;
        document.processing_status = ProcessingStatus::Completed;
        Ok(())
    }

    /// Drops a document and deletes its file. Used when an upload fails part-way.
    pub async fn discard(&self, doc_id: &str) {
        let removed = self.write().remove(doc_id);
        if let Some(document) = removed {
            if let Err(e) = tokio::fs::remove_file(&document.file_path).await {
                warn!(%doc_id, "Failed to delete file of discarded document: {e}");
            }
            info!(%doc_id, "Discarded document.");
        }
    }

    /// Reads the stored PDF bytes of a document.
    pub async fn read_file(&self, doc_id: &str) -> Result<Vec<u8>, DocfieldError> {
        let file_path = self.get_document(doc_id)?.file_path;
        Ok(tokio::fs::read(file_path).await?)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Document>> {
        self.documents.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Document>> {
        self.documents.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(doc_id: &str) -> DocfieldError {
    DocfieldError::NotFound(format!("document '{doc_id}'"))
}

fn check_page(document: &Document, page_number: u32) -> Result<(), DocfieldError> {
    if document.contains_page(page_number) {
        Ok(())
    } else {
        Err(DocfieldError::PageOutOfRange {
            page: page_number,
            total_pages: document.total_pages,
        })
    }
}
