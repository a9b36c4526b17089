//! # TUI Application State
//!
//! This module defines the core state and logic for the interactive document viewer.

use crate::{api_client::ApiClient, view_state::ViewState};
use docfield::fields::parse_field_list;

/// Represents the different input modes for the TUI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// The user is navigating between pages.
    Normal,
    /// The user is editing the field list for a re-extraction.
    Editing,
}

/// The core state for the TUI application.
pub struct App {
    /// `true` if the application is running, `false` to exit.
    pub running: bool,
    /// The document being viewed.
    pub view: ViewState,
    /// A message to display in the status bar.
    pub status: String,
    /// The client for making API calls.
    pub api_client: ApiClient,
    /// The current input mode.
    pub input_mode: InputMode,
    /// The text currently in the input box.
    pub input_text: String,
}

impl App {
    pub fn new(api_client: ApiClient, view: ViewState) -> Self {
        let status = format!(
            "{} pages loaded. ←/→ to navigate, 'r' to re-extract, 'q' to quit.",
            view.total_pages
        );
        Self {
            running: true,
            view,
            status,
            api_client,
            input_mode: InputMode::Normal,
            input_text: String::new(),
        }
    }

    /// Sets the `running` flag to false to exit the main loop.
    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn next_page(&mut self) {
        self.view.next_page();
        self.status = format!("Page {} of {}.", self.view.current_page(), self.view.total_pages);
    }

    pub fn prev_page(&mut self) {
        self.view.prev_page();
        self.status = format!("Page {} of {}.", self.view.current_page(), self.view.total_pages);
    }

    /// Opens the input box, pre-filled with the field list of the current page.
    pub fn start_reextract(&mut self) {
        let fields = self
            .view
            .current()
            .map(|page| page.key_fields.clone())
            .unwrap_or_else(|| self.view.key_fields.clone());
        self.input_text = fields.join(", ");
        self.input_mode = InputMode::Editing;
        self.status = "Edit the fields, <Enter> to extract, <Esc> to cancel.".to_string();
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_text.clear();
        self.status = "Re-extraction cancelled.".to_string();
    }

    /// Re-extracts the current page with the fields in the input box and merges the result.
    pub async fn submit_reextract(&mut self) {
        let raw_fields = std::mem::take(&mut self.input_text);
        self.input_mode = InputMode::Normal;

        let fields = match parse_field_list(&raw_fields) {
            Ok(fields) => fields,
            Err(e) => {
                self.status = format!("Invalid field list: {e}");
                return;
            }
        };

        let page_number = self.view.current_page();
        self.status = format!("Re-extracting page {page_number}...");

        match self
            .api_client
            .reextract_page(&self.view.doc_id, page_number, &fields)
            .await
        {
            Ok(result) => {
                let found = result.extracted_fields.len();
                self.view.merge_page(result);
                self.status = format!(
                    "Page {page_number} re-extracted: {found} of {} fields found.",
                    fields.len()
                );
            }
            Err(e) => {
                self.status = format!("Error re-extracting page {page_number}: {e}");
            }
        }
    }
}
