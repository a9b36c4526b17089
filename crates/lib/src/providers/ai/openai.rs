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

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    content: Option<String>,
}

// --- OpenAI Provider implementation ---

/// A provider for OpenAI's chat completions API or any compatible server.
#[derive(Clone, Debug)]
pub struct OpenAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiProvider {
    pub const DEFAULT_API_URL: &'static str = "https://api.openai.com/v1/chat/completions";

    /// Creates a new `OpenAiProvider` whose requests give up after `timeout`.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(ProviderError::ReqwestClientBuild)?;
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
impl VisionProvider for OpenAiProvider {
    async fn generate(&self, request: VisionRequest<'_>) -> Result<String, ProviderError> {
        let data_uri = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&request.image.png)
        );

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(request.system_prompt),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: request.user_prompt,
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl { url: data_uri },
                        },
                    ]),
                },
            ],
            temperature: self.temperature,
            max_completion_tokens: self.max_tokens,
            response_format: request.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
            stream: false,
        };

        let mut request_builder = self.client.post(&self.api_url);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        debug!(model = %self.model, url = %self.api_url, "--> Sending vision request");
        let response = request_builder
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

        // A body that stalls or breaks off is a transport failure, not a bad reply.
        let body = response.bytes().await.map_err(ProviderError::AiRequest)?;
        let chat_response: ChatResponse =
            serde_json::from_slice(&body).map_err(ProviderError::AiDeserialization)?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
