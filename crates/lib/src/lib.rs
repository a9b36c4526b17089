//! # docfield
//!
//! Extracts named fields from the pages of an uploaded PDF with a hosted
//! vision-language model. Every page is rasterized, sent to the model together
//! with the requested field names, and the validated reply is stored per page
//! with a confidence score. Single pages can be re-extracted later with a
//! different field list.
//!
//! The crate is transport-agnostic. The HTTP server drives it through
//! [`Orchestrator`] and the terminal client reuses its data types.

pub mod errors;
pub mod extractor;
pub mod fields;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod render;
pub mod store;
pub mod types;

pub use errors::{DocfieldError, ProviderError};
pub use extractor::{FieldExtractor, TaskPrompts};
pub use orchestrator::Orchestrator;
pub use render::PageRenderer;
pub use store::DocumentStore;
pub use types::{Document, ExtractedField, PageImage, PageResult, ProcessingStatus};
