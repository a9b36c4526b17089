#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Deterministic stand-ins for the vision model and the PDF renderer, so the
//! store and orchestrator can be tested without PDFium or network access.

use async_trait::async_trait;
use docfield::{
    providers::ai::{VisionProvider, VisionRequest},
    DocfieldError, DocumentStore, FieldExtractor, Orchestrator, PageImage, PageRenderer,
    ProviderError,
};
use dotenvy::dotenv;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Once, RwLock,
};
use tempfile::TempDir;

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// A minimal byte payload that passes the store's PDF header check.
pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n% test document\n";

// --- Mock Vision Provider ---

/// How the mock answers a field extraction request.
#[derive(Clone, Debug)]
pub enum MockReply {
    /// Every requested field is found with value `<field>-p<page>` and confidence 0.9.
    EchoFields,
    /// The same raw text for every call.
    Fixed(String),
    /// Fails every call as an unreachable upstream would.
    Unavailable,
}

#[derive(Clone, Debug)]
pub struct MockVisionProvider {
    pub reply: MockReply,
    /// The user prompts received, in call order.
    pub call_history: Arc<RwLock<Vec<String>>>,
}

impl MockVisionProvider {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            call_history: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.call_history.read().unwrap().len()
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn generate(&self, request: VisionRequest<'_>) -> Result<String, ProviderError> {
        self.call_history
            .write()
            .unwrap()
            .push(request.user_prompt.to_string());

        match &self.reply {
            MockReply::Fixed(text) => Ok(text.clone()),
            MockReply::Unavailable => Err(ProviderError::AiApi {
                status: 503,
                body: "model overloaded".to_string(),
            }),
            MockReply::EchoFields => {
                let page = String::from_utf8_lossy(&request.image.png).to_string();
                let reply: serde_json::Map<String, serde_json::Value> =
                    requested_fields(request.user_prompt)
                        .into_iter()
                        .map(|field| {
                            let value = serde_json::json!({
                                "value": format!("{field}-p{}", page.trim_start_matches("page-")),
                                "confidence": 0.9
                            });
                            (field, value)
                        })
                        .collect();
                Ok(serde_json::Value::Object(reply).to_string())
            }
        }
    }

    fn model_name(&self) -> &str {
        "mock-vision"
    }
}

/// Reads the quoted field names back out of the default extraction prompt.
pub fn requested_fields(user_prompt: &str) -> Vec<String> {
    let marker = "extract the following fields:";
    let line = user_prompt
        .lines()
        .find(|line| line.contains(marker))
        .unwrap_or_default();
    line.split(marker)
        .nth(1)
        .unwrap_or_default()
        .split(',')
        .map(|name| name.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

// --- Scripted Renderer ---

/// Reports a fixed page count, optionally fails one page, and renders page `n`
/// as the bytes `page-n`.
#[derive(Clone, Debug)]
pub struct ScriptedRenderer {
    pub pages: u32,
    pub fail_on_page: Option<u32>,
    pub render_calls: Arc<AtomicUsize>,
}

impl ScriptedRenderer {
    pub fn new(pages: u32) -> Self {
        Self {
            pages,
            fail_on_page: None,
            render_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_on(mut self, page: u32) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    pub fn renders(&self) -> usize {
        self.render_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    async fn page_count(&self, _pdf_data: &[u8]) -> Result<u32, DocfieldError> {
        Ok(self.pages)
    }

    async fn render_page(
        &self,
        _pdf_data: &[u8],
        page_number: u32,
    ) -> Result<PageImage, DocfieldError> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        if page_number == 0 || page_number > self.pages {
            return Err(DocfieldError::PageOutOfRange {
                page: page_number,
                total_pages: self.pages,
            });
        }
        if self.fail_on_page == Some(page_number) {
            return Err(DocfieldError::RenderFailure(format!(
                "corrupt content stream on page {page_number}"
            )));
        }
        Ok(PageImage {
            png: format!("page-{page_number}").into_bytes(),
            width: 1224,
            height: 1584,
        })
    }

    async fn page_text(
        &self,
        _pdf_data: &[u8],
        page_number: u32,
    ) -> Result<Option<String>, DocfieldError> {
        Ok(Some(format!("text of page {page_number}")))
    }
}

// --- Harness ---

pub struct TestPipeline {
    pub orchestrator: Orchestrator,
    pub store: Arc<DocumentStore>,
    pub provider: MockVisionProvider,
    pub renderer: ScriptedRenderer,
    pub upload_dir: TempDir,
}

/// Wires an orchestrator over a temporary upload directory and the given stand-ins.
pub fn pipeline(renderer: ScriptedRenderer, reply: MockReply) -> TestPipeline {
    setup_tracing();
    let upload_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = Arc::new(
        DocumentStore::new(upload_dir.path(), 1024 * 1024).expect("Failed to create store"),
    );
    let provider = MockVisionProvider::new(reply);
    let extractor = Arc::new(FieldExtractor::new(Box::new(provider.clone())));
    let orchestrator =
        Orchestrator::new(store.clone(), Arc::new(renderer.clone()), extractor).with_concurrency(2);

    TestPipeline {
        orchestrator,
        store,
        provider,
        renderer,
        upload_dir,
    }
}

pub fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
