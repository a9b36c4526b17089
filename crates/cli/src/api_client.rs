//! # API Client
//!
//! This module provides a client for interacting with the `docfield-server` API.
//! It handles request construction and unwraps the `result` of each response.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use docfield::{PageResult, ProcessingStatus};
use reqwest::{multipart, Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::{path::Path, time::Duration};
use tracing::info;

/// A document as returned by `POST /upload-pdf` and `GET /document/{doc_id}`.
#[derive(Clone, Debug, Deserialize)]
pub struct DocumentView {
    pub doc_id: String,
    pub filename: String,
    pub total_pages: u32,
    pub key_fields: Vec<String>,
    pub pages: Vec<PageResult>,
    pub processing_status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub total_processing_time_ms: u64,
}

/// The client for making API calls to the `docfield-server`.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a new `ApiClient`. Requests give up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Uploads a PDF and waits until every page has been extracted.
    pub async fn upload(&self, path: &Path, fields: &[String]) -> Result<DocumentView> {
        let pdf_data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.pdf".to_string());

        let url = format!("{}/upload-pdf", self.base_url);
        info!("Uploading '{}' ({} bytes) to: {}", filename, pdf_data.len(), url);

        let part = multipart::Part::bytes(pdf_data)
            .file_name(filename)
            .mime_str("application/pdf")?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("key_fields", serde_json::to_string(fields)?);

        let response = self.client.post(&url).multipart(form).send().await?;
        unwrap_result(response, "upload PDF").await
    }

    /// Fetches a document with all of its stored page results.
    pub async fn get_document(&self, doc_id: &str) -> Result<DocumentView> {
        let url = format!("{}/document/{doc_id}", self.base_url);
        info!("Fetching document from: {}", url);

        let response = self.client.get(&url).send().await?;
        unwrap_result(response, "fetch document").await
    }

    /// Re-runs extraction on a single page with a new field list.
    pub async fn reextract_page(
        &self,
        doc_id: &str,
        page_number: u32,
        fields: &[String],
    ) -> Result<PageResult> {
        let url = format!("{}/document/{doc_id}/page/{page_number}/extract", self.base_url);
        info!("Re-extracting {:?} via: {}", fields, url);

        let payload = json!({ "key_fields": fields });
        let response = self.client.post(&url).json(&payload).send().await?;
        unwrap_result(response, "re-extract page").await
    }

    /// Downloads the rendered PNG of a page into `out` and returns its size in bytes.
    pub async fn download_page_image(
        &self,
        doc_id: &str,
        page_number: u32,
        out: &Path,
    ) -> Result<usize> {
        let url = format!("{}/document/{doc_id}/page/{page_number}/image", self.base_url);
        info!("Downloading page image from: {}", url);

        let response = ensure_success(self.client.get(&url).send().await?, "download page image")
            .await?;
        let bytes = response.bytes().await?;
        tokio::fs::write(out, &bytes)
            .await
            .with_context(|| format!("Failed to write '{}'", out.display()))?;
        Ok(bytes.len())
    }
}

/// Fails with the server's error code and detail when the status is not a success.
async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<Value>(&error_text) {
        Ok(body) if body["error"].is_string() => bail!(
            "Failed to {action}. Server responded with {status} ({}): {}",
            body["error"].as_str().unwrap_or_default(),
            body["detail"].as_str().unwrap_or_default()
        ),
        _ => bail!("Failed to {action}. Server responded with {status}: {error_text}"),
    }
}

/// Every JSON endpoint wraps its payload as `{"result": ...}`.
async fn unwrap_result<T: DeserializeOwned>(response: Response, action: &str) -> Result<T> {
    let response = ensure_success(response, action).await?;
    let mut api_response: Value = response.json().await?;
    let result = api_response["result"].take();
    serde_json::from_value(result)
        .with_context(|| format!("Unexpected response body while trying to {action}"))
}
