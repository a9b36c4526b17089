//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The state owns the single document store of the
//! process and the orchestrator that every handler drives.

use crate::config::{AppConfig, FIELD_EXTRACTION_TASK, LANGUAGE_DETECTION_TASK};
use docfield::{
    providers::{ai::VisionProvider, factory::create_provider},
    DocumentStore, FieldExtractor, Orchestrator, PageRenderer, TaskPrompts,
};
use docfield_pdf::PdfiumRenderer;
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

/// A fully resolved task configuration with non-optional fields.
#[derive(Clone, Debug)]
pub struct ResolvedTask {
    pub provider: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

impl From<&ResolvedTask> for TaskPrompts {
    fn from(task: &ResolvedTask) -> Self {
        TaskPrompts {
            system_prompt: task.system_prompt.clone(),
            user_prompt: task.user_prompt.clone(),
        }
    }
}

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<AppConfig>,
    /// A map of fully resolved tasks.
    pub tasks: Arc<HashMap<String, ResolvedTask>>,
    /// The pipeline behind every document route.
    pub orchestrator: Arc<Orchestrator>,
}

/// Builds the shared application state with the PDFium renderer.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let renderer = PdfiumRenderer::new(
        config.pdfium_library_path.as_ref().map(PathBuf::from),
        config.render_scale,
    );
    build_app_state_with_renderer(config, Arc::new(renderer)).await
}

/// Builds the shared application state around the given page renderer.
///
/// Only the providers referenced by a task are instantiated, so an unused
/// provider entry without an API key does not prevent startup.
pub async fn build_app_state_with_renderer(
    config: AppConfig,
    renderer: Arc<dyn PageRenderer>,
) -> anyhow::Result<AppState> {
    let mut resolved_tasks = HashMap::new();
    for (name, task_config) in &config.tasks {
        let provider = task_config.provider.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'provider' field")
        })?;
        let system_prompt = task_config.system_prompt.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'system_prompt' field")
        })?;
        let user_prompt = task_config.user_prompt.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'user_prompt' field")
        })?;

        resolved_tasks.insert(
            name.clone(),
            ResolvedTask {
                provider,
                system_prompt,
                user_prompt,
            },
        );
    }

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let mut ai_providers: HashMap<String, Box<dyn VisionProvider>> = HashMap::new();
    for task in resolved_tasks.values() {
        if ai_providers.contains_key(&task.provider) {
            continue;
        }
        let provider_config = config.providers.get(&task.provider).ok_or_else(|| {
            anyhow::anyhow!("Task references unknown provider '{}'", task.provider)
        })?;
        let provider = create_provider(&task.provider, provider_config, timeout)?;
        ai_providers.insert(task.provider.clone(), provider);
    }

    let task_provider = |task_name: &str| -> anyhow::Result<(Box<dyn VisionProvider>, TaskPrompts)> {
        let task = resolved_tasks
            .get(task_name)
            .ok_or_else(|| anyhow::anyhow!("Task '{task_name}' is not configured"))?;
        let provider = ai_providers
            .get(&task.provider)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Provider '{}' was not created", task.provider))?;
        Ok((provider, TaskPrompts::from(task)))
    };

    let (extraction_provider, extraction_prompts) = task_provider(FIELD_EXTRACTION_TASK)?;
    let (language_provider, language_prompts) = task_provider(LANGUAGE_DETECTION_TASK)?;
    let extractor = FieldExtractor::new(extraction_provider)
        .with_extraction_prompts(extraction_prompts)
        .with_language_detection(language_provider, language_prompts);

    let store = DocumentStore::new(&config.upload_dir, config.max_file_size)?;
    info!(
        upload_dir = %config.upload_dir,
        max_file_size = config.max_file_size,
        model = %extractor.model_name(),
        "Initialized document store and extractor."
    );

    let orchestrator = Orchestrator::new(Arc::new(store), renderer, Arc::new(extractor))
        .with_concurrency(config.extraction_concurrency);

    Ok(AppState {
        config: Arc::new(config),
        tasks: Arc::new(resolved_tasks),
        orchestrator: Arc::new(orchestrator),
    })
}
