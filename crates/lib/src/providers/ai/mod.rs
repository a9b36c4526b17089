pub mod gemini;
pub mod openai;

use crate::{errors::ProviderError, types::PageImage};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// Default sampling settings shared by the provider implementations.
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// A single multimodal request: two prompts and the page image the model reasons over.
#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    pub image: &'a PageImage,
    /// Asks the provider to constrain its output to a JSON object.
    pub json_output: bool,
}

/// A trait for interacting with a hosted vision-language model.
///
/// Implementations make exactly one outbound call per `generate` and return
/// the raw text of the model's reply.
#[async_trait]
pub trait VisionProvider: Send + Sync + Debug + DynClone {
    async fn generate(&self, request: VisionRequest<'_>) -> Result<String, ProviderError>;

    /// The model identifier requests are sent to.
    fn model_name(&self) -> &str;
}

dyn_clone::clone_trait_object!(VisionProvider);
