//! # Common Test Utilities
//!
//! `TestApp` spawns the real server on a random port. The vision model is an
//! `httpmock::MockServer` speaking the OpenAI chat completions protocol, and
//! pages are "rendered" by the PDFium-free `FakeRenderer`.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use docfield_server::{config, router, state::build_app_state_with_renderer, state::AppState};
use docfield_test_utils::FakeRenderer;
use httpmock::MockServer;
use reqwest::{multipart, Client, Response};
use serde_json::Value;
use std::{fs::File, io::Write, net::SocketAddr, path::PathBuf, sync::Arc};
use tempfile::{tempdir, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

pub const CHAT_PATH: &str = "/v1/chat/completions";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub renderer: FakeRenderer,
    pub upload_dir: PathBuf,
    pub app_state: AppState,
    _config_dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server with a 10 MiB upload limit.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_limit(10 * 1024 * 1024).await
    }

    pub async fn spawn_with_limit(max_file_size: usize) -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let mock_server = MockServer::start_async().await;
        let config_dir = tempdir()?;
        let upload_dir = config_dir.path().join("uploads");
        let config_path = config_dir.path().join("config.yml");
        let config_content = format!(
            r#"
port: 0
upload_dir: "{}"
max_file_size: {max_file_size}
request_timeout_secs: 5
providers:
  openai_default:
    provider: "local"
    api_url: "{}"
    api_key: null
    model_name: "mock-vision-model"
"#,
            upload_dir.display(),
            mock_server.url(CHAT_PATH)
        );
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config = config::get_config(Some(&config_path.to_string_lossy()))?;
        let renderer = FakeRenderer::new();
        let app_state = build_app_state_with_renderer(config, Arc::new(renderer.clone())).await?;
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            renderer,
            upload_dir,
            app_state: app_state_for_harness,
            _config_dir: config_dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Posts a file to `/upload-pdf` with the given raw `key_fields` value.
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>, key_fields: &str) -> Result<Response> {
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("key_fields", key_fields.to_string());
        Ok(self
            .client
            .post(format!("{}/upload-pdf", self.address))
            .multipart(form)
            .send()
            .await?)
    }

    /// Uploads a PDF and returns the `result` of a successful response.
    pub async fn upload_ok(&self, pdf: Vec<u8>, key_fields: &str) -> Result<Value> {
        let response = self.upload("invoice.pdf", pdf, key_fields).await?;
        let status = response.status();
        let body: Value = response.json().await?;
        anyhow::ensure!(status.is_success(), "upload failed with {status}: {body}");
        Ok(body["result"].clone())
    }

    pub async fn get_json(&self, path: &str) -> Result<(u16, Value)> {
        let response = self
            .client
            .get(format!("{}{path}", self.address))
            .send()
            .await?;
        let status = response.status().as_u16();
        Ok((status, response.json().await?))
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<(u16, Value)> {
        let response = self
            .client
            .post(format!("{}{path}", self.address))
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        Ok((status, response.json().await?))
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// The text a request body contains when the user prompt asks for exactly `fields`.
///
/// Matches the JSON-escaped first line of the extraction prompt.
pub fn prompt_for(fields: &[&str]) -> String {
    let quoted = fields
        .iter()
        .map(|f| format!("\\\"{f}\\\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("following fields: {quoted}\\n")
}

/// The base64 marker of the fake rendering of `page` inside a request body.
pub fn image_of_page(page: u32) -> String {
    let encoded = match page {
        1 => "cGFnZS0x",
        2 => "cGFnZS0y",
        3 => "cGFnZS0z",
        _ => panic!("no marker for page {page}"),
    };
    format!("base64,{encoded}")
}

/// Field names of a page object in a response.
pub fn field_names(page: &Value) -> Vec<String> {
    page["extracted_fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f["field_name"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
