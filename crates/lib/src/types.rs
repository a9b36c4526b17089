//! # Core Data Model
//!
//! Documents, their per-page extraction results, and the rasterized page
//! images passed between the renderer and the vision model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One (name, value, confidence) record produced by the vision model for a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub field_name: String,
    pub value: String,
    /// Always within `0.0..=1.0`.
    pub confidence: f64,
}

/// The extraction output for a single page of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed.
    pub page_number: u32,
    /// The field list that was supplied for this extraction.
    pub key_fields: Vec<String>,
    pub extracted_fields: Vec<ExtractedField>,
    /// Text embedded in the PDF page, when it has any.
    #[serde(default)]
    pub text_content: Option<String>,
    pub processing_time_ms: u64,
    pub extracted_at: DateTime<Utc>,
}

impl PageResult {
    /// Returns the extracted field with the given name, if the model found it.
    pub fn field(&self, name: &str) -> Option<&ExtractedField> {
        self.extracted_fields.iter().find(|f| f.field_name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Processing,
    Completed,
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStatus::Processing => write!(f, "processing"),
            ProcessingStatus::Completed => write!(f, "completed"),
        }
    }
}

/// One uploaded PDF and its derived metadata and results.
#[derive(Debug, Clone)]
pub struct Document {
    pub doc_id: String,
    pub filename: String,
    pub file_path: PathBuf,
    pub total_pages: u32,
    /// The field names requested at upload time. Never changed by re-extraction.
    pub key_fields: Vec<String>,
    /// Page results keyed by page number.
    pub pages: BTreeMap<u32, PageResult>,
    pub processing_status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn contains_page(&self, page_number: u32) -> bool {
        (1..=self.total_pages).contains(&page_number)
    }
}

/// A rasterized PDF page, PNG-encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct PageImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl fmt::Debug for PageImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageImage")
            .field("bytes", &self.png.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
