//! # AI Provider Factory
//!
//! Builds a `VisionProvider` from a named provider configuration. Both the
//! server and any other consumer of the library go through this function, so
//! provider selection behaves the same everywhere.

use crate::{
    errors::ProviderError,
    providers::ai::{
        gemini::GeminiProvider, openai::OpenAiProvider, VisionProvider, DEFAULT_MAX_TOKENS,
        DEFAULT_TEMPERATURE,
    },
};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

/// A reusable configuration for a specific AI provider instance.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// The type of provider: `openai` (also `local` for compatible servers) or `gemini`.
    pub provider: String,
    /// The API URL. Optional where it can be derived.
    #[serde(default)]
    pub api_url: Option<String>,
    /// The API key, which can be null for local servers.
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("Unsupported AI provider type '{kind}' for provider '{name}'")]
    UnsupportedProvider { name: String, kind: String },
    #[error("api_key is required for {kind} provider '{name}'")]
    MissingApiKey { name: String, kind: String },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Instantiates the provider described by `config`.
pub fn create_provider(
    name: &str,
    config: &ProviderConfig,
    timeout: Duration,
) -> Result<Box<dyn VisionProvider>, FactoryError> {
    let max_tokens = config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
    let temperature = config.temperature.unwrap_or(DEFAULT_TEMPERATURE);
    let api_key = config.api_key.clone().filter(|key| !key.is_empty());

    let provider: Box<dyn VisionProvider> = match config.provider.as_str() {
        "openai" | "local" => {
            if config.provider == "openai" && api_key.is_none() && config.api_url.is_none() {
                return Err(FactoryError::MissingApiKey {
                    name: name.to_string(),
                    kind: config.provider.clone(),
                });
            }
            let api_url = config
                .api_url
                .clone()
                .unwrap_or_else(|| OpenAiProvider::DEFAULT_API_URL.to_string());
            Box::new(
                OpenAiProvider::new(api_url, api_key, config.model_name.clone(), timeout)?
                    .with_sampling(max_tokens, temperature),
            )
        }
        "gemini" => {
            let api_key = api_key.ok_or_else(|| FactoryError::MissingApiKey {
                name: name.to_string(),
                kind: config.provider.clone(),
            })?;
            Box::new(
                GeminiProvider::new(
                    config.api_url.clone(),
                    api_key,
                    config.model_name.clone(),
                    timeout,
                )?
                .with_sampling(max_tokens, temperature),
            )
        }
        other => {
            return Err(FactoryError::UnsupportedProvider {
                name: name.to_string(),
                kind: other.to_string(),
            })
        }
    };

    info!(
        provider = name,
        kind = %config.provider,
        model = %config.model_name,
        "Configured vision provider."
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: &str, api_key: Option<&str>, api_url: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            provider: kind.to_string(),
            api_url: api_url.map(String::from),
            api_key: api_key.map(String::from),
            model_name: "test-model".to_string(),
            max_tokens: None,
            temperature: None,
        }
    }

    #[test]
    fn hosted_openai_requires_a_key() {
        let err = create_provider("p", &config("openai", None, None), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, FactoryError::MissingApiKey { .. }));

        let provider =
            create_provider("p", &config("openai", Some("sk"), None), Duration::from_secs(1))
                .unwrap();
        assert_eq!(provider.model_name(), "test-model");
    }

    #[test]
    fn local_provider_works_without_a_key() {
        let provider = create_provider(
            "p",
            &config("local", None, Some("http://localhost:1234/v1/chat/completions")),
            Duration::from_secs(1),
        );
        assert!(provider.is_ok());
    }

    #[test]
    fn unknown_provider_kind_is_rejected() {
        let err = create_provider("p", &config("bedrock", Some("k"), None), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, FactoryError::UnsupportedProvider { .. }));
    }
}
