use thiserror::Error;

/// Errors raised while talking to a hosted vision model.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(serde_json::Error),
    #[error("AI provider returned status {status}: {body}")]
    AiApi { status: u16, body: String },
    #[error("AI provider returned an empty response")]
    EmptyResponse,
}

/// The error type for every document, rendering and extraction operation.
#[derive(Error, Debug)]
pub enum DocfieldError {
    #[error("Only PDF files are allowed: {0}")]
    InvalidFileKind(String),
    #[error("File size {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },
    #[error("At least one field name is required")]
    EmptyFieldList,
    #[error("Invalid field list: {0}")]
    InvalidFieldList(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Page {page} is out of range for a document with {total_pages} pages")]
    PageOutOfRange { page: u32, total_pages: u32 },
    #[error("Failed to render PDF: {0}")]
    RenderFailure(String),
    #[error("Model response is invalid: {0}")]
    ModelResponseInvalid(String),
    #[error("Hosted model is unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("An internal error occurred: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DocfieldError {
    /// A stable, machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            DocfieldError::InvalidFileKind(_) => "invalid_file_kind",
            DocfieldError::FileTooLarge { .. } => "file_too_large",
            DocfieldError::EmptyFieldList => "empty_field_list",
            DocfieldError::InvalidFieldList(_) => "invalid_field_list",
            DocfieldError::NotFound(_) => "not_found",
            DocfieldError::PageOutOfRange { .. } => "page_out_of_range",
            DocfieldError::RenderFailure(_) => "render_failure",
            DocfieldError::ModelResponseInvalid(_) => "model_response_invalid",
            DocfieldError::UpstreamUnavailable(_) => "upstream_unavailable",
            DocfieldError::Io(_) => "io_error",
            DocfieldError::Internal(_) => "internal_error",
        }
    }
}

impl From<ProviderError> for DocfieldError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::AiRequest(e) if e.is_timeout() => {
                DocfieldError::UpstreamUnavailable(format!("request timed out: {e}"))
            }
            ProviderError::AiRequest(e) => DocfieldError::UpstreamUnavailable(e.to_string()),
            ProviderError::AiApi { status, body } => {
                DocfieldError::UpstreamUnavailable(format!("status {status}: {body}"))
            }
            ProviderError::AiDeserialization(e) => DocfieldError::ModelResponseInvalid(format!(
                "could not decode provider envelope: {e}"
            )),
            ProviderError::EmptyResponse => {
                DocfieldError::ModelResponseInvalid("empty completion".to_string())
            }
            ProviderError::ReqwestClientBuild(e) => {
                DocfieldError::Internal(anyhow::anyhow!("failed to build HTTP client: {e}"))
            }
        }
    }
}
