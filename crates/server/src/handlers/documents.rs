//! # Document Handlers
//!
//! Upload, lookup, single-page re-extraction and the page viewer routes.

use super::{wrap_response, ApiResponse, AppError, AppState, DebugParams};
use crate::{
    config::FIELD_EXTRACTION_TASK,
    types::{DocumentResponse, FieldList, LanguageResponse, PageResponse, ReextractRequest},
};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{Multipart, WithRejection};
use docfield::{fields::parse_field_list, DocfieldError};
use serde_json::json;
use std::time::Instant;
use tracing::info;

fn debug_info(app_state: &AppState, started: Instant) -> serde_json::Value {
    json!({
        "model": app_state.orchestrator.extractor().model_name(),
        "provider": app_state
            .tasks
            .get(FIELD_EXTRACTION_TASK)
            .map(|task| task.provider.as_str()),
        "elapsed_ms": started.elapsed().as_millis() as u64,
    })
}

/// Handler for `POST /upload-pdf`.
///
/// Expects a multipart body with a `file` part and a `key_fields` part holding
/// either a comma-separated list or a JSON array of field names.
pub async fn upload_pdf_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<DocumentResponse>>, AppError> {
    let started = Instant::now();
    let mut pdf_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut key_fields: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                filename = Some(field.file_name().unwrap_or("upload.pdf").to_string());
                pdf_data = Some(field.bytes().await?.to_vec());
            }
            "key_fields" => {
                key_fields = Some(field.text().await?);
            }
            _ => {}
        }
    }

    let pdf_data = pdf_data
        .ok_or_else(|| AppError::BadRequest("The 'file' part is required.".to_string()))?;
    let filename = filename.unwrap_or_else(|| "upload.pdf".to_string());
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(DocfieldError::InvalidFileKind(format!("'{filename}' is not a .pdf file")).into());
    }
    let key_fields = parse_field_list(key_fields.as_deref().unwrap_or(""))?;

    info!(
        filename = %filename,
        size = pdf_data.len(),
        fields = ?key_fields,
        "Received PDF upload."
    );

    let document = app_state
        .orchestrator
        .process_document(&pdf_data, &filename, &key_fields)
        .await?;

    let debug = debug_info(&app_state, started);
    Ok(wrap_response(
        DocumentResponse::from(document),
        debug_params,
        Some(debug),
    ))
}

/// Handler for `GET /document/{doc_id}`.
pub async fn get_document_handler(
    State(app_state): State<AppState>,
    Path(doc_id): Path<String>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<DocumentResponse>>, AppError> {
    let document = app_state.orchestrator.store().get_document(&doc_id)?;
    let debug = json!({ "file_path": document.file_path.display().to_string() });
    Ok(wrap_response(
        DocumentResponse::from(document),
        debug_params,
        Some(debug),
    ))
}

/// Handler for `GET /document/{doc_id}/page/{page}`. Returns the stored result without re-extracting.
pub async fn get_page_handler(
    State(app_state): State<AppState>,
    WithRejection(Path((doc_id, page_number)), _): WithRejection<Path<(String, u32)>, AppError>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<PageResponse>>, AppError> {
    let page = app_state
        .orchestrator
        .store()
        .get_page_result(&doc_id, page_number)?;
    Ok(wrap_response(
        PageResponse::new(&doc_id, page),
        debug_params,
        None,
    ))
}

/// Handler for `POST /document/{doc_id}/page/{page}/extract`.
pub async fn reextract_page_handler(
    State(app_state): State<AppState>,
    WithRejection(Path((doc_id, page_number)), _): WithRejection<Path<(String, u32)>, AppError>,
    debug_params: Query<DebugParams>,
    WithRejection(Json(payload), _): WithRejection<Json<ReextractRequest>, AppError>,
) -> Result<Json<ApiResponse<PageResponse>>, AppError> {
    let started = Instant::now();
    let key_fields = match payload.key_fields {
        FieldList::List(names) => names,
        FieldList::Text(raw) => parse_field_list(&raw)?,
    };
    info!(%doc_id, page = page_number, fields = ?key_fields, "Re-extracting page.");

    let page = app_state
        .orchestrator
        .reextract_page(&doc_id, page_number, &key_fields)
        .await?;

    let debug = debug_info(&app_state, started);
    Ok(wrap_response(
        PageResponse::new(&doc_id, page),
        debug_params,
        Some(debug),
    ))
}

/// Handler for `GET /document/{doc_id}/page/{page}/image`. Responds with `image/png`.
pub async fn page_image_handler(
    State(app_state): State<AppState>,
    WithRejection(Path((doc_id, page_number)), _): WithRejection<Path<(String, u32)>, AppError>,
) -> Result<Response, AppError> {
    let image = app_state
        .orchestrator
        .page_image(&doc_id, page_number)
        .await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], image.png).into_response())
}

/// Handler for `GET /document/{doc_id}/page/{page}/language`.
pub async fn page_language_handler(
    State(app_state): State<AppState>,
    WithRejection(Path((doc_id, page_number)), _): WithRejection<Path<(String, u32)>, AppError>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<LanguageResponse>>, AppError> {
    let started = Instant::now();
    let language = app_state
        .orchestrator
        .detect_page_language(&doc_id, page_number)
        .await?;

    let debug = debug_info(&app_state, started);
    Ok(wrap_response(
        LanguageResponse {
            page_number,
            language,
        },
        debug_params,
        Some(debug),
    ))
}
