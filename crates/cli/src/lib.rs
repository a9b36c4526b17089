//! # docfield-cli
//!
//! A terminal client for `docfield-server`: upload PDFs, inspect and
//! re-extract single pages, and browse results in a TUI.

pub mod api_client;
pub mod app;
pub mod ui;
pub mod view_state;
