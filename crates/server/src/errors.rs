use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::multipart::MultipartError;
use chrono::Utc;
use docfield::DocfieldError;
use serde_json::json;
use tracing::{error, warn};

/// A custom error type for the server application.
///
/// Every variant becomes a JSON body of the form
/// `{"error": <code>, "detail": <message>, "timestamp": <RFC 3339>}`.
#[derive(Debug)]
pub enum AppError {
    /// Errors originating from the `docfield` pipeline.
    Docfield(DocfieldError),
    /// The multipart body could not be read.
    Multipart(MultipartError),
    /// The request is malformed in a way the pipeline never sees.
    BadRequest(String),
    /// A path or JSON body extractor refused the request.
    Rejected { status: StatusCode, detail: String },
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<DocfieldError> for AppError {
    fn from(err: DocfieldError) -> Self {
        AppError::Docfield(err)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Multipart(err)
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

/// Maps a pipeline error kind to its HTTP status.
pub fn status_for(err: &DocfieldError) -> StatusCode {
    match err {
        DocfieldError::InvalidFileKind(_)
        | DocfieldError::EmptyFieldList
        | DocfieldError::InvalidFieldList(_) => StatusCode::BAD_REQUEST,
        DocfieldError::NotFound(_) | DocfieldError::PageOutOfRange { .. } => StatusCode::NOT_FOUND,
        DocfieldError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        DocfieldError::RenderFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DocfieldError::ModelResponseInvalid(_) => StatusCode::BAD_GATEWAY,
        DocfieldError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        DocfieldError::Io(_) | DocfieldError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, code, detail) = match self {
            AppError::Docfield(err) => {
                let status = status_for(&err);
                if status.is_server_error() || status == StatusCode::BAD_GATEWAY {
                    error!("DocfieldError: {:?}", err);
                } else {
                    warn!("Request rejected: {}", err);
                }
                (status, err.code(), err.to_string())
            }
            AppError::Multipart(err) => {
                warn!("Multipart error: {}", err);
                let status = err.status();
                let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "file_too_large"
                } else {
                    "bad_request"
                };
                (status, code, err.body_text())
            }
            AppError::BadRequest(detail) => {
                warn!("Bad request: {}", detail);
                (StatusCode::BAD_REQUEST, "bad_request", detail)
            }
            AppError::Rejected { status, detail } => {
                warn!("Request rejected by extractor: {}", detail);
                (status, "bad_request", detail)
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "detail": detail,
            "timestamp": Utc::now().to_rfc3339(),
        }));

        (status_code, body).into_response()
    }
}
