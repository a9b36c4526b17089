//! # Application Configuration
//!
//! This module defines the configuration structure for the `docfield-server`
//! and loads it in layers, each one overriding the one before:
//!
//! 1. Programmatic defaults, including the built-in task prompts.
//! 2. `config.yml` (or an explicit path), with `${VAR}` substitution.
//! 3. Plain environment variables for top-level keys (`PORT`, `UPLOAD_DIR`, ...).
//! 4. `DOCFIELD__` prefixed variables for nested keys
//!    (e.g. `DOCFIELD__PROVIDERS__OPENAI_DEFAULT__MODEL_NAME`).
//! 5. `OPENAI_API_KEY` / `GEMINI_API_KEY` for providers that still lack a key.

use docfield::{
    prompts::tasks::{
        FIELD_EXTRACTION_SYSTEM_PROMPT, FIELD_EXTRACTION_USER_PROMPT,
        LANGUAGE_DETECTION_SYSTEM_PROMPT, LANGUAGE_DETECTION_USER_PROMPT,
    },
    providers::{
        ai::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE},
        factory::ProviderConfig,
    },
};
use config::{
    Config as ConfigBuilder, Environment, File, FileFormat, Value as ConfigValue,
    ValueKind as ConfigValueKind,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use tracing::info;

pub const FIELD_EXTRACTION_TASK: &str = "field_extraction";
pub const LANGUAGE_DETECTION_TASK: &str = "language_detection";
pub const DEFAULT_PROVIDER: &str = "openai_default";

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates an explicitly requested configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Where uploaded PDFs are written. Also served under `/uploads`.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Upload size limit in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    /// Origins allowed by CORS. `ALLOWED_ORIGINS` takes a comma-separated list.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Timeout for one request to the vision model.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Pages of one upload extracted at the same time.
    #[serde(default = "default_extraction_concurrency")]
    pub extraction_concurrency: usize,
    /// Directory holding the PDFium shared library. The system library is used when unset.
    #[serde(default)]
    pub pdfium_library_path: Option<String>,
    /// Render scale relative to 72 DPI.
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,
    /// A map of named, reusable AI provider configurations.
    pub providers: HashMap<String, ProviderConfig>,
    /// A map of tasks, each specifying a provider and prompts.
    pub tasks: HashMap<String, TaskConfig>,
}

fn default_port() -> u16 {
    8000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_max_file_size() -> usize {
    10 * 1024 * 1024
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_extraction_concurrency() -> usize {
    4
}

fn default_render_scale() -> f32 {
    2.0
}

/// Defines the prompts and provider for a specific application task.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskConfig {
    /// The key of the provider to use from the `providers` map.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

/// Constructs a `config::Value` map of the default tasks from the library.
fn build_default_tasks() -> HashMap<String, ConfigValue> {
    let tasks = vec![
        (
            FIELD_EXTRACTION_TASK,
            (
                DEFAULT_PROVIDER,
                FIELD_EXTRACTION_SYSTEM_PROMPT,
                FIELD_EXTRACTION_USER_PROMPT,
            ),
        ),
        (
            LANGUAGE_DETECTION_TASK,
            (
                DEFAULT_PROVIDER,
                LANGUAGE_DETECTION_SYSTEM_PROMPT,
                LANGUAGE_DETECTION_USER_PROMPT,
            ),
        ),
    ];

    tasks
        .into_iter()
        .map(|(name, (provider, sys, user))| {
            let mut table = HashMap::new();
            table.insert("provider".to_string(), ConfigValue::from(provider));
            table.insert("system_prompt".to_string(), ConfigValue::from(sys));
            table.insert("user_prompt".to_string(), ConfigValue::from(user));
            (
                name.to_string(),
                ConfigValue::new(None, ConfigValueKind::Table(table)),
            )
        })
        .collect()
}

/// The hosted OpenAI model the service uses when nothing else is configured.
fn build_default_providers() -> HashMap<String, ConfigValue> {
    let mut table = HashMap::new();
    table.insert("provider".to_string(), ConfigValue::from("openai"));
    table.insert("model_name".to_string(), ConfigValue::from("gpt-5-nano"));
    table.insert(
        "max_tokens".to_string(),
        ConfigValue::from(DEFAULT_MAX_TOKENS as i64),
    );
    table.insert(
        "temperature".to_string(),
        ConfigValue::from(DEFAULT_TEMPERATURE as f64),
    );

    let mut providers = HashMap::new();
    providers.insert(
        DEFAULT_PROVIDER.to_string(),
        ConfigValue::new(None, ConfigValueKind::Table(table)),
    );
    providers
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &Path) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ConfigError::General(format!(
            "Failed to read config file '{}': {e}",
            path.display()
        ))
    })?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Picks the main config file: an explicit path, `./config.yml`, or the crate's own `config.yml`.
fn main_config_path(config_path_override: Option<&str>) -> Option<String> {
    if let Some(override_path) = config_path_override {
        return Some(override_path.to_string());
    }
    ["config.yml".to_string(), format!("{}/config.yml", env!("CARGO_MANIFEST_DIR"))]
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
}

/// Loads the application configuration from defaults, a file and environment variables.
///
/// A missing `config.yml` is fine and leaves the defaults in place, but an
/// explicitly requested path that does not exist is an error.
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults.
        .set_default("providers", build_default_providers())?
        .set_default("tasks", build_default_tasks())?;

    // Layer 2: Main config file.
    if let Some(path) = main_config_path(config_path_override) {
        let content = read_and_substitute(Path::new(&path))?.ok_or_else(|| {
            ConfigError::NotFound(format!("Config file not found at '{path}'."))
        })?;
        info!("Loading configuration from '{path}'.");
        builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
    } else {
        info!("No config.yml found. Using built-in defaults.");
    }

    let settings = builder
        // Layer 3: Plain environment variables for top-level keys like PORT.
        .add_source(
            Environment::default()
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("allowed_origins"),
        )
        // Layer 4: Prefixed environment variables for nested overrides.
        .add_source(
            Environment::with_prefix("DOCFIELD")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;

    // Layer 5: Well-known API key variables fill in providers without a key.
    for provider in config.providers.values_mut() {
        if provider.api_key.as_deref().is_some_and(|key| !key.is_empty()) {
            continue;
        }
        let key_var = match provider.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            "gemini" => "GEMINI_API_KEY",
            _ => continue,
        };
        if let Ok(key) = env::var(key_var) {
            if !key.is_empty() {
                provider.api_key = Some(key);
            }
        }
    }

    Ok(config)
}
