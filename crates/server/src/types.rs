use chrono::{DateTime, Utc};
use docfield::{Document, ExtractedField, PageResult, ProcessingStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize, Default)]
pub struct DebugParams {
    pub debug: Option<bool>,
}

#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
    pub result: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// A page result as returned to clients, with the URL of its rendered image.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse {
    pub page_number: u32,
    pub key_fields: Vec<String>,
    pub extracted_fields: Vec<ExtractedField>,
    pub text_content: Option<String>,
    pub processing_time_ms: u64,
    pub extracted_at: DateTime<Utc>,
    pub page_image_url: String,
}

impl PageResponse {
    pub fn new(doc_id: &str, page: PageResult) -> Self {
        Self {
            page_image_url: page_image_url(doc_id, page.page_number),
            page_number: page.page_number,
            key_fields: page.key_fields,
            extracted_fields: page.extracted_fields,
            text_content: page.text_content,
            processing_time_ms: page.processing_time_ms,
            extracted_at: page.extracted_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub doc_id: String,
    pub filename: String,
    pub total_pages: u32,
    pub key_fields: Vec<String>,
    /// Ordered by page number.
    pub pages: Vec<PageResponse>,
    pub processing_status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
    /// Sum of the per-page processing times.
    pub total_processing_time_ms: u64,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        let total_processing_time_ms = document
            .pages
            .values()
            .map(|page| page.processing_time_ms)
            .sum();
        let doc_id = document.doc_id;
        let pages = document
            .pages
            .into_values()
            .map(|page| PageResponse::new(&doc_id, page))
            .collect();
        Self {
            filename: document.filename,
            total_pages: document.total_pages,
            key_fields: document.key_fields,
            pages,
            processing_status: document.processing_status,
            created_at: document.created_at,
            total_processing_time_ms,
            doc_id,
        }
    }
}

/// A field list given either as a JSON array or as a comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FieldList {
    List(Vec<String>),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub struct ReextractRequest {
    pub key_fields: FieldList,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageResponse {
    pub page_number: u32,
    pub language: String,
}

pub fn page_image_url(doc_id: &str, page_number: u32) -> String {
    format!("/document/{doc_id}/page/{page_number}/image")
}
