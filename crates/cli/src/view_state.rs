//! # View State
//!
//! The client-side copy of one document: its header, its page results keyed by
//! page number, and the page currently on screen.

use crate::api_client::DocumentView;
use docfield::PageResult;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct ViewState {
    pub doc_id: String,
    pub filename: String,
    pub total_pages: u32,
    /// The field list requested at upload time.
    pub key_fields: Vec<String>,
    pages: BTreeMap<u32, PageResult>,
    current_page: u32,
}

impl ViewState {
    pub fn new(document: DocumentView) -> Self {
        let pages = document
            .pages
            .into_iter()
            .map(|page| (page.page_number, page))
            .collect();
        Self {
            doc_id: document.doc_id,
            filename: document.filename,
            total_pages: document.total_pages,
            key_fields: document.key_fields,
            pages,
            current_page: 1,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// The stored result of the page on screen, if it has been extracted.
    pub fn current(&self) -> Option<&PageResult> {
        self.pages.get(&self.current_page)
    }

    pub fn page(&self, page_number: u32) -> Option<&PageResult> {
        self.pages.get(&page_number)
    }

    pub fn pages(&self) -> impl Iterator<Item = &PageResult> {
        self.pages.values()
    }

    /// Replaces the entry of `result.page_number` and leaves every other page alone.
    ///
    /// Returns the result it replaced.
    pub fn merge_page(&mut self, result: PageResult) -> Option<PageResult> {
        self.pages.insert(result.page_number, result)
    }

    pub fn next_page(&mut self) {
        self.go_to(self.current_page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.go_to(self.current_page.saturating_sub(1));
    }

    /// Moves to `page_number`, clamped to `[1, total_pages]`.
    pub fn go_to(&mut self, page_number: u32) {
        self.current_page = page_number.clamp(1, self.total_pages.max(1));
    }

    /// Requested fields of the current page that the model did not find.
    pub fn missing_fields(&self) -> Vec<&str> {
        match self.current() {
            Some(page) => page
                .key_fields
                .iter()
                .filter(|name| page.field(name).is_none())
                .map(String::as_str)
                .collect(),
            None => Vec::new(),
        }
    }
}

/// How much to trust an extracted value, for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl From<f64> for ConfidenceLevel {
    fn from(confidence: f64) -> Self {
        if confidence >= 0.8 {
            ConfidenceLevel::High
        } else if confidence >= 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl ConfidenceLevel {
    pub fn label(self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}
