use crate::{
    errors::ProviderError,
    providers::ai::{VisionProvider, VisionRequest, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE},
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};
use tracing::debug;

// --- Gemini-specific request and response structures ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Deserialize, Debug)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize, Debug)]
struct PartResponse {
    #[serde(default)]
    text: String,
}

// --- Gemini Provider implementation ---

/// A provider for the Google Gemini `generateContent` API.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider`. When `api_url` is `None` it is derived from the model name.
    pub fn new(
        api_url: Option<String>,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(ProviderError::ReqwestClientBuild)?;
        let api_url = api_url.unwrap_or_else(|| {
            format!("https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent")
        });
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl VisionProvider for GeminiProvider {
    async fn generate(&self, request: VisionRequest<'_>) -> Result<String, ProviderError> {
        let request_body = GeminiRequest {
            system_instruction: Content {
                parts: vec![Part::Text {
                    text: request.system_prompt,
                }],
            },
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: request.user_prompt,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: general_purpose::STANDARD.encode(&request.image.png),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
                response_mime_type: request.json_output.then_some("application/json"),
            },
        };

        debug!(model = %self.model, "--> Sending vision request to Gemini");
        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", &self.api_key)])
            .json(&request_body)
            .send()
            .await
            .map_err(ProviderError::AiRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AiApi {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(ProviderError::AiRequest)?;
        let gemini_response: GeminiResponse =
            serde_json::from_slice(&body).map_err(ProviderError::AiDeserialization)?;

        let text: String = gemini_response
            .candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
